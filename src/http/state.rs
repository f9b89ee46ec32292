use crate::dispatcher::Dispatcher;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Dispatcher every bridge call is submitted to
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}
