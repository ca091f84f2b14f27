// src/routes/status.rs
//! Sync status and manual trigger endpoints.
//!
//! - `GET /status` – latest cycle summary per vendor
//! - `POST /sync/{vendor}` – run one cycle now, subject to the same
//!   skip-if-running guard as the scheduler

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::{CycleSummary, Vendor};

// ---

#[derive(Serialize)]
struct VendorStatus {
    vendor: Vendor,
    running: bool,
    last_cycle: Option<CycleSummary>,
}

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/status", get(status))
        .route("/sync/{vendor}", post(trigger))
}

async fn status(State(state): State<AppState>) -> Json<Vec<VendorStatus>> {
    // ---
    let mut out = Vec::with_capacity(state.runners.len());
    for runner in state.runners.iter() {
        out.push(VendorStatus {
            vendor: runner.vendor(),
            running: runner.is_running(),
            last_cycle: runner.last_summary().await,
        });
    }
    Json(out)
}

async fn trigger(Path(vendor): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let Some(runner) = Vendor::parse(&vendor).and_then(|v| state.runner(v)) else {
        return (StatusCode::NOT_FOUND, Json(format!("unknown vendor '{vendor}'"))).into_response();
    };

    info!("POST /sync/{} - manual trigger", runner.vendor());
    match runner.trigger().await {
        Some(summary) => (StatusCode::OK, Json(summary)).into_response(),
        None => (
            StatusCode::CONFLICT,
            Json(format!("{} sync already running", runner.vendor())),
        )
            .into_response(),
    }
}
