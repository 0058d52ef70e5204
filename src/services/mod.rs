//! Scoring engines and the cascade orchestrator

pub mod cascade;
pub mod pis;
pub mod scs;
pub mod uba;

pub use cascade::CascadeOrchestrator;
pub use pis::PisEngine;
pub use scs::ScsEngine;
pub use uba::UbaEngine;

use crate::error::EngineResult;
use crate::models::Review;
use crate::store::TrustStore;

/// UBA substitute for reviewers that have never been scored
pub(crate) const NEUTRAL_REVIEWER_UBA: f64 = 0.7;

/// Aggregate review ratings weighted by the authors' UBA scores.
///
/// Each author's UBA (neutral 0.7 when unscored) is squared to widen the gap
/// between trusted and suspicious reviewers. Ratings are normalized from
/// [1,5] onto [-1,1] before weighting and the weighted mean is remapped back
/// to [0,1]. Used identically by the PIS review factor and the SCS seller-
/// review factor.
pub(crate) async fn uba_weighted_review_factor(
    store: &dyn TrustStore,
    reviews: &[Review],
    empty_default: f64,
) -> EngineResult<f64> {
    if reviews.is_empty() {
        return Ok(empty_default);
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for review in reviews {
        let uba = store
            .get_user(review.user_id)
            .await?
            .and_then(|u| u.uba_score)
            .unwrap_or(NEUTRAL_REVIEWER_UBA);
        let weight = uba * uba;
        let normalized_rating = (review.rating as f64 - 3.0) / 2.0;
        weighted_sum += normalized_rating * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        Ok(((weighted_sum / total_weight) + 1.0) / 2.0)
    } else {
        // Every reviewer carries a zero UBA; nothing trustworthy to aggregate
        Ok(0.5)
    }
}
