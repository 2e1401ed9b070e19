pub mod api;
pub mod config;
pub mod process;
pub mod publish;
pub mod registry;

use std::sync::Arc;

/// Shared handles the HTTP handlers work with.
pub struct AppState<R, P> {
    pub registry: Arc<R>,
    pub publisher: Arc<P>,
}

impl<R, P> AppState<R, P> {
    pub fn new(registry: R, publisher: P) -> Self {
        Self {
            registry: Arc::new(registry),
            publisher: Arc::new(publisher),
        }
    }
}

impl<R, P> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            publisher: Arc::clone(&self.publisher),
        }
    }
}
