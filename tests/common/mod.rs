//! Shared fixtures: an in-process mock of both vendor APIs and a recording
//! station store.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing_subscriber::fmt::MakeWriter;

use hydrosync::{CanonicalReading, StationStore, Stores};

// ---

/// Canned vendor responses plus a log of what was requested.
#[derive(Default)]
pub struct MockVendors {
    /// `None` answers the batch call with HTTP 500.
    pub aptech_body: Mutex<Option<Value>>,
    /// Per-device bodies; unknown ids get HTTP 404.
    pub higertech: Mutex<HashMap<String, Value>>,
    /// Device ids whose request answers with HTTP 503.
    pub higertech_down: Mutex<HashSet<String>>,
    pub aptech_hits: Mutex<u32>,
    pub higertech_requests: Mutex<Vec<String>>,
    /// When set, the batch handler waits for a permit before answering.
    pub aptech_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockVendors {
    // ---
    pub fn set_aptech(&self, body: Option<Value>) {
        *self.aptech_body.lock().unwrap() = body;
    }

    pub fn set_higertech(&self, device_id: &str, body: Value) {
        self.higertech
            .lock()
            .unwrap()
            .insert(device_id.to_string(), body);
    }

    pub fn requested_devices(&self) -> Vec<String> {
        self.higertech_requests.lock().unwrap().clone()
    }
}

async fn aptech_handler(State(mock): State<Arc<MockVendors>>) -> (StatusCode, Json<Value>) {
    // ---
    *mock.aptech_hits.lock().unwrap() += 1;

    let gate = mock.aptech_gate.lock().unwrap().clone();
    if let Some(gate) = gate {
        let _permit = gate.acquire().await.unwrap();
    }

    match mock.aptech_body.lock().unwrap().clone() {
        Some(body) => (StatusCode::OK, Json(body)),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "down" })),
        ),
    }
}

async fn higertech_handler(
    Path(device_id): Path<String>,
    State(mock): State<Arc<MockVendors>>,
) -> (StatusCode, Json<Value>) {
    // ---
    mock.higertech_requests
        .lock()
        .unwrap()
        .push(device_id.clone());

    if mock.higertech_down.lock().unwrap().contains(&device_id) {
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
    }
    match mock.higertech.lock().unwrap().get(&device_id) {
        Some(body) => (StatusCode::OK, Json(body.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "not found" }))),
    }
}

/// Bind `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
    // ---
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Start the mock vendor server. Aptech lives at `{base}/aptech`,
/// Higertech at `{base}/v2`.
pub async fn start_mock_vendors() -> (Arc<MockVendors>, String) {
    // ---
    let mock = Arc::new(MockVendors::default());
    let app = Router::new()
        .route("/aptech", get(aptech_handler))
        .route("/v2/reading/device/{device_id}", get(higertech_handler))
        .with_state(Arc::clone(&mock));
    let base = serve(app).await;
    (mock, base)
}

/// In-memory store that records writes and can fail for chosen devices.
#[derive(Default)]
pub struct RecordingStore {
    pub written: Mutex<Vec<CanonicalReading>>,
    pub calls: Mutex<u32>,
    pub fail_for: Mutex<HashSet<String>>,
}

impl RecordingStore {
    // ---
    pub fn fail_device(&self, device_id: &str) {
        self.fail_for.lock().unwrap().insert(device_id.to_string());
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.device_id.clone())
            .collect()
    }

    pub fn get(&self, device_id: &str) -> Option<CanonicalReading> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.device_id == device_id)
            .cloned()
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StationStore for RecordingStore {
    async fn update_by_device_id(&self, reading: &CanonicalReading) -> Result<()> {
        // ---
        *self.calls.lock().unwrap() += 1;
        if self.fail_for.lock().unwrap().contains(&reading.device_id) {
            anyhow::bail!("simulated write failure for {}", reading.device_id);
        }
        self.written.lock().unwrap().push(reading.clone());
        Ok(())
    }
}

pub fn recording_stores() -> (Stores, Arc<RecordingStore>, Arc<RecordingStore>) {
    // ---
    let awlr = Arc::new(RecordingStore::default());
    let arr = Arc::new(RecordingStore::default());
    let stores = Stores {
        water_level: awlr.clone(),
        rainfall: arr.clone(),
    };
    (stores, awlr, arr)
}

pub fn higertech_body(device_id: &str, fields: Value) -> Value {
    // ---
    let mut entry = json!({ "device_id": device_id });
    if let (Some(obj), Some(extra)) = (entry.as_object_mut(), fields.as_object()) {
        for (k, v) in extra {
            obj.insert(k.clone(), v.clone());
        }
    }
    json!({ "response": [ { "device_id": "OTHER" }, entry ] })
}

/// Log sink for asserting on emitted warnings.
///
/// Installed per test with [`capture_warnings`]; the subscriber is
/// thread-local, so it sees everything the current-thread test runtime
/// executes.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    // ---
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.contains("WARN"))
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route WARN and above into a buffer until the guard is dropped.
pub fn capture_warnings() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    // ---
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
