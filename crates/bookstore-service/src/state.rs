//! Application state.

use bookstore_ledger::Ledger;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The consistency core every handler goes through.
    pub ledger: Ledger,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(ledger: Ledger, config: ServiceConfig) -> Self {
        Self { ledger, config }
    }
}
