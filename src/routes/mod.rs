use std::sync::Arc;

use axum::Router;

use crate::scheduler::SyncRunner;
use crate::Vendor;

mod health;
mod status;

// ---

/// Shared state for the operational routes: one runner per vendor.
#[derive(Clone)]
pub struct AppState {
    runners: Arc<Vec<Arc<SyncRunner>>>,
}

impl AppState {
    // ---
    pub fn new(runners: Vec<Arc<SyncRunner>>) -> Self {
        AppState {
            runners: Arc::new(runners),
        }
    }

    fn runner(&self, vendor: Vendor) -> Option<&Arc<SyncRunner>> {
        self.runners.iter().find(|r| r.vendor() == vendor)
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(status::router())
        .merge(health::router())
        .with_state(state)
}
