use chrono::Utc;

use super::models::NewReview;
use super::store::ReviewStore;
use crate::error::StoreError;

/// Sample reviews inserted into an empty store at startup
fn sample_reviews() -> Vec<NewReview> {
    [
        ("1", "user1", 5, "Great smartphone, amazing camera!"),
        ("1", "user2", 4, "Good phone but battery life could be better"),
        ("2", "user1", 5, "Excellent laptop for professional work"),
        ("3", "user3", 4, "Great sound quality, comfortable to wear"),
    ]
    .into_iter()
    .map(|(product_id, user_name, rating, comment)| NewReview {
        product_id: product_id.to_string(),
        user_name: user_name.to_string(),
        rating,
        comment: comment.to_string(),
    })
    .collect()
}

/// Insert the sample reviews when the store holds none.
/// Returns how many were inserted.
pub async fn seed_if_empty(store: &dyn ReviewStore) -> Result<usize, StoreError> {
    if !store.is_empty().await? {
        tracing::info!("Reviews already seeded");
        return Ok(0);
    }

    let samples = sample_reviews();
    let count = samples.len();
    for sample in samples {
        store.insert(&sample.into_review(Utc::now())).await?;
    }

    tracing::info!(count, "🌱 Seeded sample reviews");
    Ok(count)
}
