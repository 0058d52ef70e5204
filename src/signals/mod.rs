//! External signal-provider contracts
//!
//! The engines consume five risk-lookup capabilities through these traits so
//! that mock and live implementations are swappable without touching engine
//! logic. Every call site resolves a provider through [`resolve_signal`],
//! which bounds the wait time and substitutes the provider's documented
//! fallback on failure or timeout: a slow or unreachable signal source must
//! never block or fail a score computation.

pub mod heuristics;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use heuristics::{
    DescriptionHeuristic, DisposableEmailTable, LexicalTextAnalyzer, ProxyPrefixTable,
    StockPhotoDetector,
};

/// Fallback risk when an IP reputation lookup fails
pub const IP_RISK_FALLBACK: f64 = 0.1;
/// Fallback risk when a disposable-email check fails
pub const EMAIL_RISK_FALLBACK: f64 = 0.1;
/// Fallback risk when the text analyzer fails
pub const TEXT_RISK_FALLBACK: f64 = 0.2;
/// Fallback risk when the description analyzer fails
pub const DESCRIPTION_RISK_FALLBACK: f64 = 0.2;
/// Fallback risk when the image heuristic fails
pub const IMAGE_RISK_FALLBACK: f64 = 0.1;

/// Signal lookup failure. Recovered locally with a fallback risk, never
/// surfaced past an engine boundary.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("signal lookup failed: {0}")]
    Lookup(String),

    #[error("signal provider unavailable: {0}")]
    Unavailable(String),
}

/// Proxy / VPN reputation for a source IP
#[async_trait]
pub trait IpRiskProvider: Send + Sync {
    async fn check_ip_risk(&self, ip: &str) -> Result<f64, SignalError>;
}

/// Disposable-domain check for an email address
#[async_trait]
pub trait EmailRiskProvider: Send + Sync {
    async fn check_email_disposable(&self, email: &str) -> Result<f64, SignalError>;
}

/// Linguistic risk of a review text (spam phrasing, bot-like sentiment)
#[async_trait]
pub trait TextRiskProvider: Send + Sync {
    async fn analyze_text_risk(&self, text: &str) -> Result<f64, SignalError>;
}

/// High-pressure language / vagueness risk of a product description
#[async_trait]
pub trait DescriptionRiskProvider: Send + Sync {
    async fn analyze_description_risk(&self, text: &str) -> Result<f64, SignalError>;
}

/// Stock-photo / missing-image risk of a listing's image URLs
#[async_trait]
pub trait ImageRiskProvider: Send + Sync {
    async fn analyze_image_risk(&self, urls: &[String]) -> Result<f64, SignalError>;
}

/// The full set of injected signal providers
#[derive(Clone)]
pub struct SignalSet {
    pub ip: Arc<dyn IpRiskProvider>,
    pub email: Arc<dyn EmailRiskProvider>,
    pub text: Arc<dyn TextRiskProvider>,
    pub description: Arc<dyn DescriptionRiskProvider>,
    pub image: Arc<dyn ImageRiskProvider>,
}

impl SignalSet {
    /// The deterministic heuristic providers. Pure functions of their input,
    /// so repeated score computations over unchanged data are idempotent.
    pub fn deterministic() -> Self {
        Self {
            ip: Arc::new(ProxyPrefixTable::default()),
            email: Arc::new(DisposableEmailTable::default()),
            text: Arc::new(LexicalTextAnalyzer::default()),
            description: Arc::new(DescriptionHeuristic::default()),
            image: Arc::new(StockPhotoDetector::default()),
        }
    }
}

/// Await a signal lookup with a bounded wait, falling back on error/timeout.
///
/// The returned risk is clamped to [0,1] regardless of what the provider
/// reports.
pub async fn resolve_signal<F>(
    lookup: F,
    timeout: Duration,
    fallback: f64,
    signal: &'static str,
) -> f64
where
    F: Future<Output = Result<f64, SignalError>>,
{
    match tokio::time::timeout(timeout, lookup).await {
        Ok(Ok(risk)) => risk.clamp(0.0, 1.0),
        Ok(Err(err)) => {
            tracing::warn!(signal, error = %err, fallback, "Signal lookup failed, using fallback risk");
            fallback
        }
        Err(_) => {
            tracing::warn!(signal, fallback, "Signal lookup timed out, using fallback risk");
            fallback
        }
    }
}
