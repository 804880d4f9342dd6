//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::service::RagService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    service: Arc<RagService>,
}

impl AppState {
    /// Create state with the providers named in the config
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing RAG application state...");
        Ok(Self::from_service(Arc::new(RagService::new(config)?)))
    }

    /// Wrap an existing service
    pub fn from_service(service: Arc<RagService>) -> Self {
        Self { service }
    }

    /// The RAG service
    pub fn service(&self) -> &RagService {
        &self.service
    }
}
