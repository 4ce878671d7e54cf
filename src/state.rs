// src/state.rs
use std::sync::Arc;

use crate::services::completion::CompletionService;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub completion: Arc<dyn CompletionService>,
}

impl AppState {
    pub fn new(completion: impl CompletionService + 'static) -> Self {
        Self {
            completion: Arc::new(completion),
        }
    }
}
