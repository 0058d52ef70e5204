//! Marketplace trust scoring engine
//!
//! Computes three interlinked trust scores: a per-user Behavior & Anomaly
//! score (UBA), a per-product Integrity Score (PIS) and a per-seller
//! Credibility Score (SCS). The core is the cascading recalculation engine:
//! deterministic weighted-sum scoring functions plus the rule that any
//! product-integrity change triggers a seller-credibility recomputation.
//!
//! External risk lookups (IP reputation, disposable-email checks, text and
//! image heuristics) are injected behind the traits in [`signals`] and fail
//! soft to documented neutral defaults; persistence is an id-based repository
//! behind [`store::TrustStore`].

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod signals;
pub mod state;
pub mod store;

pub use error::{EngineError, EngineResult};
pub use state::AppState;
