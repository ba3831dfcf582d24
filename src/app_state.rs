use std::sync::Arc;

use crate::services::gemini::ImageGenerator;
use crate::services::store::JobStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub generator: Arc<dyn ImageGenerator>,
}

impl AppState {
    pub fn new(store: JobStore, generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            store: Arc::new(store),
            generator,
        }
    }
}
