//! Application state wiring the engines together

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::services::{CascadeOrchestrator, PisEngine, ScsEngine, UbaEngine};
use crate::signals::SignalSet;
use crate::store::TrustStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrustStore>,
    pub orchestrator: Arc<CascadeOrchestrator>,
    pub config: EngineConfig,
}

impl AppState {
    /// Build the engines and orchestrator over the given store and signal
    /// providers.
    pub fn new(store: Arc<dyn TrustStore>, signals: SignalSet, config: EngineConfig) -> Self {
        let uba = Arc::new(UbaEngine::new(store.clone(), signals.clone(), &config));
        let pis = Arc::new(PisEngine::new(store.clone(), signals.clone(), &config));
        let scs = Arc::new(ScsEngine::new(store.clone(), &config));
        let orchestrator = Arc::new(CascadeOrchestrator::new(
            store.clone(),
            signals,
            uba,
            pis,
            scs,
            &config,
        ));

        Self {
            store,
            orchestrator,
            config,
        }
    }
}
