//! Product Integrity Score (PIS) engine
//!
//! Scores a listing from description originality, price deviation against
//! same-category peers, image authenticity, UBA-weighted review sentiment and
//! the integrity-flagged return rate. The engine writes `pis_score` and its
//! timestamp; cascading into the owning seller's SCS is the orchestrator's
//! job.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::{EngineConfig, PisWeights, ScoringThresholds};
use crate::error::{EngineError, EngineResult};
use crate::models::{Product, ProductId, ScoreUpdate};
use crate::signals::{
    resolve_signal, SignalSet, DESCRIPTION_RISK_FALLBACK, IMAGE_RISK_FALLBACK,
};
use crate::store::TrustStore;

use super::uba_weighted_review_factor;

/// Factor when the product has no same-category peers to compare against
const NO_PEER_PRICE_DEFAULT: f64 = 0.75;
/// Factor when the product has no reviews
const NO_REVIEW_DEFAULT: f64 = 0.7;
/// Factor when the product has never been sold
const NO_SALES_RETURN_DEFAULT: f64 = 1.0;

pub struct PisEngine {
    store: Arc<dyn TrustStore>,
    signals: SignalSet,
    weights: PisWeights,
    thresholds: ScoringThresholds,
    signal_timeout: Duration,
}

impl PisEngine {
    pub fn new(store: Arc<dyn TrustStore>, signals: SignalSet, config: &EngineConfig) -> Self {
        Self {
            store,
            signals,
            weights: config.scoring.pis_weights.clone(),
            thresholds: config.scoring.thresholds.clone(),
            signal_timeout: config.signal_timeout,
        }
    }

    /// Compute the product's PIS and persist it with its update timestamp.
    ///
    /// Reads review/return/order state as of this invocation; nothing is
    /// cached across calls. Fails with `NotFound` for an unknown product, with
    /// no mutation.
    pub async fn compute_pis(&self, product_id: ProductId) -> EngineResult<ScoreUpdate> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("product {product_id}")))?;

        let content_originality = self.content_factor(&product).await;
        let price_deviation = self.price_factor(&product).await?;
        let image_authenticity = self.image_factor(&product).await;
        let review_sentiment = self.review_factor(product_id).await?;
        let return_analysis = self.return_factor(product_id).await?;

        tracing::debug!(
            product_id,
            content_originality,
            price_deviation,
            image_authenticity,
            review_sentiment,
            return_analysis,
            "PIS factors computed"
        );

        let w = &self.weights;
        let score = (content_originality * w.content_originality
            + price_deviation * w.price_deviation
            + image_authenticity * w.image_authenticity
            + review_sentiment * w.review_sentiment
            + return_analysis * w.return_analysis)
            .clamp(0.0, 1.0);

        let now = Utc::now();
        self.store.put_pis_score(product_id, score, now).await?;
        tracing::info!(product_id, seller_id = product.seller_id, score, "PIS score updated");

        Ok(ScoreUpdate {
            score,
            updated_at: now,
        })
    }

    /// Factor 1: description originality
    async fn content_factor(&self, product: &Product) -> f64 {
        let risk = resolve_signal(
            self.signals
                .description
                .analyze_description_risk(&product.description),
            self.signal_timeout,
            DESCRIPTION_RISK_FALLBACK,
            "description_risk",
        )
        .await;
        1.0 - risk
    }

    /// Factor 2: deviation from the median price of same-category peers.
    /// Median rather than mean, so one absurd peer listing cannot skew the
    /// baseline.
    async fn price_factor(&self, product: &Product) -> EngineResult<f64> {
        let peer_prices = self
            .store
            .category_peer_prices(&product.category, product.id)
            .await?;
        if peer_prices.is_empty() {
            return Ok(NO_PEER_PRICE_DEFAULT);
        }

        let median_price = median(peer_prices);
        if median_price <= 0.0 {
            return Ok(NO_PEER_PRICE_DEFAULT);
        }

        let deviation = (product.price - median_price).abs() / median_price;
        Ok(1.0 - deviation.min(1.0))
    }

    /// Factor 3: image authenticity. The provider reports maximum risk for a
    /// listing with no images at all.
    async fn image_factor(&self, product: &Product) -> f64 {
        let risk = resolve_signal(
            self.signals.image.analyze_image_risk(&product.image_urls),
            self.signal_timeout,
            IMAGE_RISK_FALLBACK,
            "image_risk",
        )
        .await;
        1.0 - risk
    }

    /// Factor 4: review sentiment weighted by each author's UBA
    async fn review_factor(&self, product_id: ProductId) -> EngineResult<f64> {
        let reviews = self.store.reviews_by_product(product_id).await?;
        uba_weighted_review_factor(self.store.as_ref(), &reviews, NO_REVIEW_DEFAULT).await
    }

    /// Factor 5: integrity-flagged returns against total items sold. Even a
    /// small integrity-return rate is a strong signal, hence the
    /// amplification.
    async fn return_factor(&self, product_id: ProductId) -> EngineResult<f64> {
        let items_sold = self.store.count_order_items_by_product(product_id).await?;
        if items_sold == 0 {
            return Ok(NO_SALES_RETURN_DEFAULT);
        }

        let integrity_returns = self
            .store
            .count_integrity_returns_by_product(product_id)
            .await?;
        let rate = integrity_returns as f64 / items_sold as f64;
        let risk = (rate * self.thresholds.integrity_return_amplification).min(1.0);
        Ok(1.0 - risk)
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd() {
        assert_eq!(median(vec![30.0, 10.0, 20.0]), 20.0);
    }

    #[test]
    fn test_median_even() {
        assert_eq!(median(vec![10.0, 20.0, 30.0, 40.0]), 25.0);
    }

    #[test]
    fn test_median_resists_outlier() {
        // One absurd listing barely moves the baseline
        assert_eq!(median(vec![10.0, 12.0, 11.0, 9000.0, 13.0]), 12.0);
    }
}
