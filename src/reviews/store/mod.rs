// ============================================================================
// Review Store
// ============================================================================
//
// Document-style persistence for reviews:
// - ScyllaReviewStore       - one denormalised table per lookup key
// - InMemoryReviewStore     - process-local, used for tests and demos
//
// ============================================================================

mod memory;
mod scylladb;

pub use memory::InMemoryReviewStore;
pub use scylladb::ScyllaReviewStore;

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::models::Review;
use crate::error::StoreError;

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: &Review) -> Result<(), StoreError>;

    /// Exact match on product id; empty when none
    async fn by_product(&self, product_id: &str) -> Result<Vec<Review>, StoreError>;

    /// Exact match on author name; empty when none
    async fn by_user(&self, user_name: &str) -> Result<Vec<Review>, StoreError>;

    /// Review count per product id
    async fn counts_by_product(&self) -> Result<BTreeMap<String, u64>, StoreError>;

    /// True when no review has been stored yet
    async fn is_empty(&self) -> Result<bool, StoreError>;

    fn backend_name(&self) -> &'static str;
}
