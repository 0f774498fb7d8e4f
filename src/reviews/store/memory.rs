use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::ReviewStore;
use crate::error::StoreError;
use crate::reviews::models::Review;

#[derive(Default)]
pub struct InMemoryReviewStore {
    reviews: RwLock<Vec<Review>>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.reviews.read().await.len()
    }
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn insert(&self, review: &Review) -> Result<(), StoreError> {
        self.reviews.write().await.push(review.clone());
        Ok(())
    }

    async fn by_product(&self, product_id: &str) -> Result<Vec<Review>, StoreError> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().filter(|r| r.product_id == product_id).cloned().collect())
    }

    async fn by_user(&self, user_name: &str) -> Result<Vec<Review>, StoreError> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().filter(|r| r.user_name == user_name).cloned().collect())
    }

    async fn counts_by_product(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let reviews = self.reviews.read().await;
        let mut counts = BTreeMap::new();
        for review in reviews.iter() {
            *counts.entry(review.product_id.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.reviews.read().await.is_empty())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
