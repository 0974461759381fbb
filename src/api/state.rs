use std::sync::Arc;

use crate::engine::Engine;
use crate::incident::Incident;

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    pub incidents: Arc<Vec<Incident>>,
    pub engine: Engine,
}

impl AppState {
    pub fn new(incidents: Vec<Incident>, engine: Engine) -> Self {
        Self {
            incidents: Arc::new(incidents),
            engine,
        }
    }
}
