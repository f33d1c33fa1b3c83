use std::sync::Arc;

use domains::{ContentRenderer, TokenVerifier};
use services::ForumServices;

use crate::metrics::Metrics;

/// Shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: ForumServices,
    pub verifier: Arc<dyn TokenVerifier>,
    pub renderer: Arc<dyn ContentRenderer>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        services: ForumServices,
        verifier: Arc<dyn TokenVerifier>,
        renderer: Arc<dyn ContentRenderer>,
    ) -> Self {
        Self {
            services,
            verifier,
            renderer,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
