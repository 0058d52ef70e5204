//! Configuration for the trust scoring engine
//!
//! Runtime settings come from environment variables with sensible defaults.
//! Scoring weights and thresholds are plain structs injected into each engine
//! at construction, so test suites can override them without touching engine
//! logic. Each weight set must sum to 1.0.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Weights for {0} sum to {1}, expected 1.0")]
    InvalidWeights(&'static str, f64),
}

/// Weights for the five UBA factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UbaWeights {
    /// Account age and profile completeness
    pub age_completeness: f64,
    /// IP / device consistency over the trailing session window
    pub ip_device: f64,
    /// Review posting velocity
    pub review_velocity: f64,
    /// Linguistic authenticity of recent reviews
    pub linguistic_auth: f64,
    /// Purchase-to-return ratio
    pub purchase_return: f64,
}

impl Default for UbaWeights {
    fn default() -> Self {
        Self {
            age_completeness: 0.15,
            ip_device: 0.20,
            review_velocity: 0.25,
            linguistic_auth: 0.30,
            purchase_return: 0.10,
        }
    }
}

impl UbaWeights {
    pub fn sum(&self) -> f64 {
        self.age_completeness
            + self.ip_device
            + self.review_velocity
            + self.linguistic_auth
            + self.purchase_return
    }
}

/// Weights for the five PIS factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PisWeights {
    /// Description originality and richness
    pub content_originality: f64,
    /// Price deviation from category median
    pub price_deviation: f64,
    /// Image authenticity
    pub image_authenticity: f64,
    /// UBA-weighted review sentiment
    pub review_sentiment: f64,
    /// Integrity-flagged return rate
    pub return_analysis: f64,
}

impl Default for PisWeights {
    fn default() -> Self {
        Self {
            content_originality: 0.30,
            price_deviation: 0.20,
            image_authenticity: 0.10,
            review_sentiment: 0.30,
            return_analysis: 0.10,
        }
    }
}

impl PisWeights {
    pub fn sum(&self) -> f64 {
        self.content_originality
            + self.price_deviation
            + self.image_authenticity
            + self.review_sentiment
            + self.return_analysis
    }
}

/// Weights for the five SCS factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScsWeights {
    /// Order fulfillment rate
    pub fulfillment: f64,
    /// Tenure blended with sales-velocity stability
    pub history_velocity: f64,
    /// UBA-weighted reviews across the seller's products
    pub seller_reviews: f64,
    /// Dispute / chargeback rate
    pub disputes: f64,
    /// Mean product integrity score (the PIS -> SCS interlink)
    pub avg_pis: f64,
}

impl Default for ScsWeights {
    fn default() -> Self {
        Self {
            fulfillment: 0.25,
            history_velocity: 0.15,
            seller_reviews: 0.30,
            disputes: 0.20,
            avg_pis: 0.10,
        }
    }
}

impl ScsWeights {
    pub fn sum(&self) -> f64 {
        self.fulfillment
            + self.history_velocity
            + self.seller_reviews
            + self.disputes
            + self.avg_pis
    }
}

/// Minimum-sample thresholds and scoring constants.
///
/// The canonical threshold set: a user needs more than `min_items_for_return_ratio`
/// purchased items before the return ratio departs from 1.0, a seller needs more
/// than `min_items_for_fulfillment` items before fulfillment departs from its
/// neutral default, and the velocity anomaly only evaluates once the prior
/// baseline exceeds `min_monthly_sales_baseline` per month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringThresholds {
    /// Growth constant for user account age
    pub user_age_k: f64,
    /// Growth constant for seller tenure
    pub seller_tenure_k: f64,
    /// Distinct IPs in the session window at which churn risk saturates
    pub ip_churn_cap: usize,
    /// Reviews per day at which velocity risk saturates
    pub review_velocity_cap: f64,
    /// Recent reviews sampled for linguistic analysis
    pub linguistic_sample_size: usize,
    pub min_items_for_return_ratio: usize,
    /// Multiplier applied to integrity-related return reasons
    pub integrity_return_weight: f64,
    pub min_items_for_fulfillment: usize,
    pub min_monthly_sales_baseline: f64,
    /// Sales spike ratio beyond which velocity risk accrues
    pub velocity_spike_ratio: f64,
    /// Amplification applied to integrity-return and dispute rates
    pub integrity_return_amplification: f64,
    pub dispute_amplification: f64,
    /// Trailing window, in days, for sessions / reviews / sales
    pub trailing_window_days: i64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            user_age_k: 0.1,
            seller_tenure_k: 0.05,
            ip_churn_cap: 10,
            review_velocity_cap: 5.0,
            linguistic_sample_size: 5,
            min_items_for_return_ratio: 3,
            integrity_return_weight: 3.0,
            min_items_for_fulfillment: 3,
            min_monthly_sales_baseline: 5.0,
            velocity_spike_ratio: 4.0,
            integrity_return_amplification: 5.0,
            dispute_amplification: 5.0,
            trailing_window_days: 30,
        }
    }
}

/// Full scoring configuration injected into the engines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub uba_weights: UbaWeights,
    pub pis_weights: PisWeights,
    pub scs_weights: ScsWeights,
    pub thresholds: ScoringThresholds,
}

impl ScoringConfig {
    /// Check the configuration invariant: each weight set sums to 1.0
    pub fn validate(&self) -> Result<(), ConfigError> {
        const TOLERANCE: f64 = 1e-9;

        let uba_sum = self.uba_weights.sum();
        if (uba_sum - 1.0).abs() > TOLERANCE {
            return Err(ConfigError::InvalidWeights("UBA", uba_sum));
        }
        let pis_sum = self.pis_weights.sum();
        if (pis_sum - 1.0).abs() > TOLERANCE {
            return Err(ConfigError::InvalidWeights("PIS", pis_sum));
        }
        let scs_sum = self.scs_weights.sum();
        if (scs_sum - 1.0).abs() > TOLERANCE {
            return Err(ConfigError::InvalidWeights("SCS", scs_sum));
        }
        Ok(())
    }
}

/// Application configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Log level (RUST_LOG)
    pub log_level: String,

    /// Upper bound on any single signal-provider call
    pub signal_timeout: Duration,

    /// Scoring weights and thresholds
    pub scoring: ScoringConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let signal_timeout_ms = env::var("SIGNAL_TIMEOUT_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("SIGNAL_TIMEOUT_MS must be a valid number".to_string())
            })?;

        let scoring = ScoringConfig::default();
        scoring.validate()?;

        Ok(EngineConfig {
            log_level,
            signal_timeout: Duration::from_millis(signal_timeout_ms),
            scoring,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.uba_weights.sum() - 1.0).abs() < 1e-9);
        assert!((config.pis_weights.sum() - 1.0).abs() < 1e-9);
        assert!((config.scs_weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut config = ScoringConfig::default();
        config.uba_weights.ip_device = 0.5;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("UBA"));
    }

    #[test]
    fn test_validate_reports_each_engine() {
        let mut config = ScoringConfig::default();
        config.scs_weights.disputes = 0.0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SCS"));
    }
}
