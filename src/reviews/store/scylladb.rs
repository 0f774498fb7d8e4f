use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::statement::batch::Batch;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ReviewStore;
use crate::error::StoreError;
use crate::reviews::models::Review;

// ============================================================================
// ScyllaDB Review Store
// ============================================================================
//
// Reviews are looked up by product and by author, so each review is written
// twice, once per lookup table, in a single logged batch:
//
//   reviews_by_product  PRIMARY KEY ((product_id), id)
//   reviews_by_user     PRIMARY KEY ((user_name), id)
//
// Both lookups are then single-partition reads.
//
// ============================================================================

const CREATE_BY_PRODUCT: &str = "CREATE TABLE IF NOT EXISTS reviews_by_product (
    product_id text,
    id text,
    user_name text,
    rating int,
    comment text,
    created_at timestamp,
    PRIMARY KEY ((product_id), id)
)";

const CREATE_BY_USER: &str = "CREATE TABLE IF NOT EXISTS reviews_by_user (
    user_name text,
    id text,
    product_id text,
    rating int,
    comment text,
    created_at timestamp,
    PRIMARY KEY ((user_name), id)
)";

const INSERT_BY_PRODUCT: &str = "INSERT INTO reviews_by_product
    (product_id, id, user_name, rating, comment, created_at) VALUES (?, ?, ?, ?, ?, ?)";

const INSERT_BY_USER: &str = "INSERT INTO reviews_by_user
    (user_name, id, product_id, rating, comment, created_at) VALUES (?, ?, ?, ?, ?, ?)";

const COUNT_BY_PRODUCT: &str =
    "SELECT product_id, COUNT(*) FROM reviews_by_product GROUP BY product_id";

const ANY_REVIEW: &str = "SELECT id FROM reviews_by_product LIMIT 1";

type ReviewRow = (String, String, String, i32, String, DateTime<Utc>);

fn keyspace_ddl(keyspace: &str) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
         {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
        keyspace
    )
}

fn review_from_row(row: ReviewRow) -> Review {
    let (id, product_id, user_name, rating, comment, created_at) = row;
    Review {
        id,
        product_id,
        user_name,
        rating,
        comment,
        created_at,
    }
}

pub struct ScyllaReviewStore {
    session: Arc<Session>,
}

impl ScyllaReviewStore {
    /// Connect, create the keyspace and tables if missing, and switch to the keyspace
    pub async fn connect(nodes: &[String], keyspace: &str) -> Result<Self, StoreError> {
        tracing::info!(nodes = ?nodes, keyspace, "Connecting to ScyllaDB...");

        let session: Session = SessionBuilder::new()
            .known_nodes(nodes)
            .build()
            .await
            .map_err(StoreError::backend)?;

        session
            .query_unpaged(keyspace_ddl(keyspace), &[])
            .await
            .map_err(StoreError::backend)?;
        session
            .use_keyspace(keyspace, false)
            .await
            .map_err(StoreError::backend)?;

        for ddl in [CREATE_BY_PRODUCT, CREATE_BY_USER] {
            session.query_unpaged(ddl, &[]).await.map_err(StoreError::backend)?;
        }

        tracing::info!(keyspace, "Review tables ready");
        Ok(Self::from_session(Arc::new(session)))
    }

    pub fn from_session(session: Arc<Session>) -> Self {
        Self { session }
    }

    async fn select_reviews(&self, query: &str, key: &str) -> Result<Vec<Review>, StoreError> {
        let rows_result = self
            .session
            .query_unpaged(query, (key,))
            .await
            .map_err(StoreError::backend)?
            .into_rows_result()
            .map_err(StoreError::backend)?;

        let mut reviews = Vec::new();
        for row in rows_result.rows::<ReviewRow>().map_err(StoreError::backend)? {
            reviews.push(review_from_row(row.map_err(StoreError::backend)?));
        }

        tracing::debug!(key, count = reviews.len(), "Loaded reviews");
        Ok(reviews)
    }
}

#[async_trait]
impl ReviewStore for ScyllaReviewStore {
    async fn insert(&self, review: &Review) -> Result<(), StoreError> {
        let mut batch = Batch::default();
        batch.append_statement(INSERT_BY_PRODUCT);
        batch.append_statement(INSERT_BY_USER);

        self.session
            .batch(
                &batch,
                (
                    (
                        review.product_id.as_str(),
                        review.id.as_str(),
                        review.user_name.as_str(),
                        review.rating,
                        review.comment.as_str(),
                        review.created_at,
                    ),
                    (
                        review.user_name.as_str(),
                        review.id.as_str(),
                        review.product_id.as_str(),
                        review.rating,
                        review.comment.as_str(),
                        review.created_at,
                    ),
                ),
            )
            .await
            .map_err(StoreError::backend)?;

        tracing::debug!(
            review_id = %review.id,
            product_id = %review.product_id,
            "Persisted review to both lookup tables"
        );
        Ok(())
    }

    async fn by_product(&self, product_id: &str) -> Result<Vec<Review>, StoreError> {
        self.select_reviews(
            "SELECT id, product_id, user_name, rating, comment, created_at
             FROM reviews_by_product WHERE product_id = ?",
            product_id,
        )
        .await
    }

    async fn by_user(&self, user_name: &str) -> Result<Vec<Review>, StoreError> {
        self.select_reviews(
            "SELECT id, product_id, user_name, rating, comment, created_at
             FROM reviews_by_user WHERE user_name = ?",
            user_name,
        )
        .await
    }

    async fn counts_by_product(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        // Spans every partition, so page through it instead of one large response
        let pager = self
            .session
            .query_iter(COUNT_BY_PRODUCT, &[])
            .await
            .map_err(StoreError::backend)?;
        let mut rows = std::pin::pin!(pager
            .rows_stream::<(String, i64)>()
            .map_err(StoreError::backend)?);

        let mut counts = BTreeMap::new();
        while let Some((product_id, count)) = rows.try_next().await.map_err(StoreError::backend)? {
            counts.insert(product_id, count.max(0) as u64);
        }
        Ok(counts)
    }

    async fn is_empty(&self) -> Result<bool, StoreError> {
        let rows_result = self
            .session
            .query_unpaged(ANY_REVIEW, &[])
            .await
            .map_err(StoreError::backend)?
            .into_rows_result()
            .map_err(StoreError::backend)?;
        Ok(rows_result.rows_num() == 0)
    }

    fn backend_name(&self) -> &'static str {
        "scylla"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_ddl() {
        let ddl = keyspace_ddl("reviews_ks");
        assert!(ddl.starts_with("CREATE KEYSPACE IF NOT EXISTS reviews_ks"));
        assert!(ddl.contains("'replication_factor': 1"));
    }

    #[test]
    fn test_review_from_row() {
        let now = Utc::now();
        let review = review_from_row((
            "id-1".to_string(),
            "1".to_string(),
            "user1".to_string(),
            5,
            "Great".to_string(),
            now,
        ));
        assert_eq!(review.id, "id-1");
        assert_eq!(review.product_id, "1");
        assert_eq!(review.user_name, "user1");
        assert_eq!(review.rating, 5);
        assert_eq!(review.created_at, now);
    }

    #[test]
    fn test_emptiness_check_reads_a_single_row() {
        assert!(ANY_REVIEW.ends_with("LIMIT 1"));
        assert!(COUNT_BY_PRODUCT.contains("GROUP BY product_id"));
    }

    #[test]
    fn test_lookup_tables_are_partitioned_by_lookup_key() {
        assert!(CREATE_BY_PRODUCT.contains("PRIMARY KEY ((product_id), id)"));
        assert!(CREATE_BY_USER.contains("PRIMARY KEY ((user_name), id)"));
        // Column order must line up with the bind order in insert()
        assert!(INSERT_BY_PRODUCT.contains("(product_id, id, user_name, rating, comment, created_at)"));
        assert!(INSERT_BY_USER.contains("(user_name, id, product_id, rating, comment, created_at)"));
    }
}
