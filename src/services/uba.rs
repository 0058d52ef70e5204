//! User Behavior & Anomaly (UBA) scoring engine
//!
//! Computes a buyer/reviewer trust score from five weighted factors: account
//! age and profile completeness, IP/device consistency, review velocity,
//! linguistic authenticity of recent reviews, and the purchase-to-return
//! ratio. Factor sub-computations never fail past this boundary; missing data
//! and signal failures resolve to documented neutral defaults.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{EngineConfig, ScoringThresholds, UbaWeights};
use crate::error::{EngineError, EngineResult};
use crate::models::{ScoreUpdate, User, UserId};
use crate::signals::{
    resolve_signal, SignalSet, EMAIL_RISK_FALLBACK, IP_RISK_FALLBACK, TEXT_RISK_FALLBACK,
};
use crate::store::TrustStore;

/// Factor when the user has no sessions in the trailing window
const NO_SESSION_DEFAULT: f64 = 0.8;
/// Factor when the user has authored no reviews
const NO_REVIEW_DEFAULT: f64 = 0.8;
/// Factor below the minimum purchased-item count
const NEW_ACCOUNT_RETURN_DEFAULT: f64 = 1.0;

pub struct UbaEngine {
    store: Arc<dyn TrustStore>,
    signals: SignalSet,
    weights: UbaWeights,
    thresholds: ScoringThresholds,
    signal_timeout: Duration,
}

impl UbaEngine {
    pub fn new(store: Arc<dyn TrustStore>, signals: SignalSet, config: &EngineConfig) -> Self {
        Self {
            store,
            signals,
            weights: config.scoring.uba_weights.clone(),
            thresholds: config.scoring.thresholds.clone(),
            signal_timeout: config.signal_timeout,
        }
    }

    /// Compute the user's UBA score and persist it with its update timestamp.
    ///
    /// Fails with `NotFound` if the user is unknown; no mutation happens in
    /// that case.
    pub async fn compute_uba(&self, user_id: UserId) -> EngineResult<ScoreUpdate> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))?;

        let now = Utc::now();
        let age_completeness = self.age_completeness_factor(&user, now).await;
        let ip_device = self.ip_consistency_factor(user_id, now).await?;
        let review_velocity = self.review_velocity_factor(user_id, now).await?;
        let linguistic_auth = self.linguistic_factor(user_id).await?;
        let purchase_return = self.purchase_return_factor(user_id).await?;

        tracing::debug!(
            user_id,
            age_completeness,
            ip_device,
            review_velocity,
            linguistic_auth,
            purchase_return,
            "UBA factors computed"
        );

        let w = &self.weights;
        let score = (age_completeness * w.age_completeness
            + ip_device * w.ip_device
            + review_velocity * w.review_velocity
            + linguistic_auth * w.linguistic_auth
            + purchase_return * w.purchase_return)
            .clamp(0.0, 1.0);

        self.store.put_uba_score(user_id, score, now).await?;
        tracing::info!(user_id, score, "UBA score updated");

        Ok(ScoreUpdate {
            score,
            updated_at: now,
        })
    }

    /// Factor 1: asymptotic account-age score multiplied by profile
    /// completeness, with completeness discounted by email-disposability risk.
    async fn age_completeness_factor(&self, user: &User, now: DateTime<Utc>) -> f64 {
        let days = (now - user.created_at).num_days().max(0) as f64;
        let age_score = 1.0 - 1.0 / (1.0 + days * self.thresholds.user_age_k);

        let email_risk = resolve_signal(
            self.signals.email.check_email_disposable(&user.email),
            self.signal_timeout,
            EMAIL_RISK_FALLBACK,
            "email_disposable",
        )
        .await;

        let completeness = user.profile_completeness_score.clamp(0.0, 1.0) * (1.0 - email_risk);
        age_score * completeness
    }

    /// Factor 2: IP churn and proxy risk over the trailing session window.
    ///
    /// The store returns distinct IPs, so each address costs one provider
    /// lookup per invocation.
    async fn ip_consistency_factor(&self, user_id: UserId, now: DateTime<Utc>) -> EngineResult<f64> {
        let since = now - chrono::Duration::days(self.thresholds.trailing_window_days);
        let ips = self.store.session_ips_since(user_id, since).await?;
        if ips.is_empty() {
            return Ok(NO_SESSION_DEFAULT);
        }

        let mut risk_total = 0.0;
        for ip in &ips {
            risk_total += resolve_signal(
                self.signals.ip.check_ip_risk(ip),
                self.signal_timeout,
                IP_RISK_FALLBACK,
                "ip_risk",
            )
            .await;
        }
        let avg_proxy_risk = risk_total / ips.len() as f64;
        let churn_risk = (ips.len() as f64 / self.thresholds.ip_churn_cap as f64).min(1.0);

        Ok(1.0 - avg_proxy_risk.max(churn_risk))
    }

    /// Factor 3: reviews per day over the trailing window against the
    /// velocity cap.
    async fn review_velocity_factor(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<f64> {
        let window_days = self.thresholds.trailing_window_days;
        let since = now - chrono::Duration::days(window_days);
        let recent_count = self
            .store
            .count_reviews_by_user_since(user_id, since)
            .await?;
        let per_day = recent_count as f64 / window_days as f64;
        let risk = (per_day / self.thresholds.review_velocity_cap).min(1.0);
        Ok(1.0 - risk)
    }

    /// Factor 4: mean linguistic risk over the most recent authored reviews.
    async fn linguistic_factor(&self, user_id: UserId) -> EngineResult<f64> {
        let recent = self
            .store
            .recent_reviews_by_user(user_id, self.thresholds.linguistic_sample_size)
            .await?;
        if recent.is_empty() {
            return Ok(NO_REVIEW_DEFAULT);
        }

        let mut risk_total = 0.0;
        for review in &recent {
            risk_total += resolve_signal(
                self.signals.text.analyze_text_risk(&review.review_text),
                self.signal_timeout,
                TEXT_RISK_FALLBACK,
                "text_risk",
            )
            .await;
        }

        Ok(1.0 - risk_total / recent.len() as f64)
    }

    /// Factor 5: reason-weighted return ratio, only evaluated past the
    /// minimum purchased-item count so new accounts are not penalized.
    async fn purchase_return_factor(&self, user_id: UserId) -> EngineResult<f64> {
        let item_count = self.store.count_order_items_by_user(user_id).await?;
        if item_count <= self.thresholds.min_items_for_return_ratio {
            return Ok(NEW_ACCOUNT_RETURN_DEFAULT);
        }

        let returns = self.store.returns_by_user(user_id).await?;
        let weighted_total: f64 = returns
            .iter()
            .map(|r| {
                if r.reason_category.is_integrity_related() {
                    self.thresholds.integrity_return_weight
                } else {
                    1.0
                }
            })
            .sum();

        let risk = (weighted_total / (item_count as f64 * 2.0)).min(1.0);
        Ok(1.0 - risk)
    }
}
