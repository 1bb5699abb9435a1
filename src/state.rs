// src/state.rs
use std::sync::Arc;

use crate::config::ResponderConfig;
use crate::error::ProviderError;
use crate::services::metrics_manager::MetricsManager;
use crate::services::responder::Responder;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub responder: Responder,
    pub metrics: MetricsManager,
}

impl AppState {
    pub fn new(config: &ResponderConfig) -> Result<Self, ProviderError> {
        Ok(Self::with_responder(Responder::from_config(config)?))
    }

    pub fn with_responder(responder: Responder) -> Self {
        Self {
            responder,
            metrics: MetricsManager::new(),
        }
    }
}
