//! Seller Credibility Score (SCS) engine
//!
//! Scores a seller from fulfillment performance, tenure blended with a
//! sales-velocity anomaly check, UBA-weighted reviews across all of the
//! seller's products, the dispute rate, and the mean integrity score of the
//! products themselves. The last factor is the cross-engine interlink: a
//! seller's credibility is bounded by the integrity of what they sell, so it
//! must read the products' current `pis_score`, never a snapshot taken
//! before a cascade.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{EngineConfig, ScoringThresholds, ScsWeights};
use crate::error::{EngineError, EngineResult};
use crate::models::{ScoreUpdate, Seller, SellerId};
use crate::store::TrustStore;

use super::uba_weighted_review_factor;

/// Factor below the minimum fulfilled-item count
const LOW_VOLUME_FULFILLMENT_DEFAULT: f64 = 0.7;
/// Factor when the seller has no reviews at all
const NO_REVIEW_DEFAULT: f64 = 0.7;
/// Factor when no product has a computed integrity score yet
const NO_SCORED_PRODUCT_DEFAULT: f64 = 0.7;

pub struct ScsEngine {
    store: Arc<dyn TrustStore>,
    weights: ScsWeights,
    thresholds: ScoringThresholds,
}

impl ScsEngine {
    pub fn new(store: Arc<dyn TrustStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            weights: config.scoring.scs_weights.clone(),
            thresholds: config.scoring.thresholds.clone(),
        }
    }

    /// Compute the seller's SCS and persist it with its update timestamp.
    ///
    /// Fails with `NotFound` for an unknown seller, with no mutation.
    pub async fn compute_scs(&self, seller_id: SellerId) -> EngineResult<ScoreUpdate> {
        let seller = self
            .store
            .get_seller(seller_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("seller {seller_id}")))?;

        let now = Utc::now();
        let fulfillment = self.fulfillment_factor(seller_id).await?;
        let history_velocity = self.history_velocity_factor(&seller, now).await?;
        let seller_reviews = self.review_factor(seller_id).await?;
        let disputes = self.dispute_factor(&seller);
        let avg_pis = self.average_pis_factor(seller_id).await?;

        tracing::debug!(
            seller_id,
            fulfillment,
            history_velocity,
            seller_reviews,
            disputes,
            avg_pis,
            "SCS factors computed"
        );

        let w = &self.weights;
        let score = (fulfillment * w.fulfillment
            + history_velocity * w.history_velocity
            + seller_reviews * w.seller_reviews
            + disputes * w.disputes
            + avg_pis * w.avg_pis)
            .clamp(0.0, 1.0);

        self.store.put_scs_score(seller_id, score, now).await?;
        tracing::info!(seller_id, score, "SCS score updated");

        Ok(ScoreUpdate {
            score,
            updated_at: now,
        })
    }

    /// Factor 1: (1 - cancellation rate) * on-time rate over the seller's
    /// order items, once past the minimum item count.
    async fn fulfillment_factor(&self, seller_id: SellerId) -> EngineResult<f64> {
        let items = self.store.order_items_by_seller(seller_id).await?;
        let total = items.len();
        if total <= self.thresholds.min_items_for_fulfillment {
            return Ok(LOW_VOLUME_FULFILLMENT_DEFAULT);
        }

        let on_time = items.iter().filter(|i| i.delivered_on_time).count();
        let cancelled_by_seller = items.iter().filter(|i| i.cancelled_by_seller).count();

        let on_time_rate = on_time as f64 / total as f64;
        let cancellation_rate = cancelled_by_seller as f64 / total as f64;
        Ok((1.0 - cancellation_rate) * on_time_rate)
    }

    /// Factor 2: 60/40 blend of asymptotic tenure and velocity stability.
    ///
    /// Velocity compares trailing-30-day sales to the monthly average of the
    /// preceding 90 days (days 31-120 back) and only evaluates once that
    /// baseline exceeds the minimum volume. A spike past the ratio threshold
    /// accrues risk proportional to how far past it goes.
    async fn history_velocity_factor(
        &self,
        seller: &Seller,
        now: DateTime<Utc>,
    ) -> EngineResult<f64> {
        let days_as_seller = (now - seller.created_at).num_days().max(0) as f64;
        let tenure_score = 1.0 - 1.0 / (1.0 + days_as_seller * self.thresholds.seller_tenure_k);

        let window = chrono::Duration::days(self.thresholds.trailing_window_days);
        let sales_last_30d = self
            .store
            .count_seller_sales_between(seller.id, now - window, now)
            .await?;
        let sales_prev_90d = self
            .store
            .count_seller_sales_between(seller.id, now - window * 4, now - window)
            .await?;

        let monthly_baseline = sales_prev_90d as f64 / 3.0;
        let mut velocity_risk = 0.0;
        if monthly_baseline > self.thresholds.min_monthly_sales_baseline {
            let spike_ratio = sales_last_30d as f64 / monthly_baseline;
            if spike_ratio > self.thresholds.velocity_spike_ratio {
                velocity_risk =
                    ((spike_ratio - self.thresholds.velocity_spike_ratio) / 10.0).min(1.0);
            }
        }
        let velocity_score = 1.0 - velocity_risk;

        Ok(tenure_score * 0.6 + velocity_score * 0.4)
    }

    /// Factor 3: UBA-weighted reviews over all of the seller's products
    async fn review_factor(&self, seller_id: SellerId) -> EngineResult<f64> {
        let reviews = self.store.reviews_by_seller(seller_id).await?;
        uba_weighted_review_factor(self.store.as_ref(), &reviews, NO_REVIEW_DEFAULT).await
    }

    /// Factor 4: amplified dispute rate. The rate itself is maintained
    /// externally, not computed here.
    fn dispute_factor(&self, seller: &Seller) -> f64 {
        let rate = seller.dispute_rate.clamp(0.0, 1.0);
        1.0 - (rate * self.thresholds.dispute_amplification).min(1.0)
    }

    /// Factor 5: mean current `pis_score` across the seller's scored products
    async fn average_pis_factor(&self, seller_id: SellerId) -> EngineResult<f64> {
        let products = self.store.products_by_seller(seller_id).await?;
        let scored: Vec<f64> = products.iter().filter_map(|p| p.pis_score).collect();
        if scored.is_empty() {
            return Ok(NO_SCORED_PRODUCT_DEFAULT);
        }
        Ok(scored.iter().sum::<f64>() / scored.len() as f64)
    }
}
