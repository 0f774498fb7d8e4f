use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Review Models
// ============================================================================

/// A user's opinion of a product. `product_id` is not checked against any
/// catalogue and `user_name` is free text.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Inbound review body. Any client-supplied `id` or `createdAt` is ignored.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: String,
    pub user_name: String,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReviewError {
    #[error("{0} must not be empty")]
    BlankField(&'static str),

    #[error("rating must be between {min} and {max}, got {got}", min = MIN_RATING, max = MAX_RATING)]
    RatingOutOfRange { got: i32 },
}

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

impl NewReview {
    pub fn validate(&self) -> Result<(), ReviewError> {
        if self.product_id.trim().is_empty() {
            return Err(ReviewError::BlankField("productId"));
        }
        if self.user_name.trim().is_empty() {
            return Err(ReviewError::BlankField("userName"));
        }
        if self.comment.trim().is_empty() {
            return Err(ReviewError::BlankField("comment"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ReviewError::RatingOutOfRange { got: self.rating });
        }
        Ok(())
    }

    /// Stamp a server-generated id and creation time
    pub fn into_review(self, created_at: DateTime<Utc>) -> Review {
        Review {
            id: Uuid::new_v4().to_string(),
            product_id: self.product_id,
            user_name: self.user_name,
            rating: self.rating,
            comment: self.comment,
            created_at,
        }
    }
}
