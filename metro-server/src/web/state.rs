//! Application state for the web layer.

use std::sync::Arc;

use crate::service::ScheduleService;

/// Shared application state.
pub struct AppState<S, K> {
    /// Departure query service
    pub service: Arc<ScheduleService<S, K>>,
}

impl<S, K> Clone for AppState<S, K> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S, K> AppState<S, K> {
    /// Create a new app state.
    pub fn new(service: ScheduleService<S, K>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
