// Peed Notify Mock - Notification API stand-in
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Peed Notify Mock
//!
//! Minimal HTTP endpoint accepting anomaly notifications:
//!
//! - `POST /sap/api/notifications` with a matching `X-API-TOKEN` header
//!   answers 201 `{"notif_id": "NOTIF<YYYYMMDD-HHMMSS>", "status": "enregistree"}`
//! - a missing or wrong token answers 401 `{"error": "unauthorized"}`
//!
//! Bodies that are not valid JSON are recorded as an empty object.
//! Every accepted payload is kept in [`MockState`] so tests can inspect it.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Route of the notification endpoint.
pub const NOTIFICATIONS_PATH: &str = "/sap/api/notifications";

/// Token accepted by default.
pub const DEFAULT_TOKEN: &str = "secret-token-demo";

/// Header carrying the token.
pub const TOKEN_HEADER: &str = "X-API-TOKEN";

/// Shared endpoint state
#[derive(Debug)]
pub struct MockState {
    token: String,
    received: Mutex<Vec<Value>>,
    requests: AtomicUsize,
    fail_next: AtomicUsize,
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN)
    }
}

impl MockState {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            received: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            fail_next: AtomicUsize::new(0),
        }
    }

    /// Payloads accepted so far, in arrival order.
    pub fn received(&self) -> Vec<Value> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Requests seen, accepted or not.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Answer the next `n` authorized requests with 503.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Router serving the notification endpoint.
pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route(NOTIFICATIONS_PATH, post(create_notification))
        .with_state(state)
}

/// Bind `addr` and serve in the background.
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn spawn(
    addr: SocketAddr,
    state: Arc<MockState>,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(state)).await {
            warn!("Mock server stopped: {}", e);
        }
    });
    Ok((local, handle))
}

/// Identifier derived from the current UTC second.
pub fn notification_id() -> String {
    format!("NOTIF{}", Utc::now().format("%Y%m%d-%H%M%S"))
}

async fn create_notification(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token != state.token {
        warn!("[MOCK] Rejected notification: bad token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        );
    }

    if state.take_failure() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "unavailable" })),
        );
    }

    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Null) | Err(_) => json!({}),
        Ok(value) => value,
    };

    let notif_id = notification_id();
    info!("[MOCK] Notification received -> ID={} | payload={}", notif_id, payload);
    state
        .received
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .push(payload);

    (
        StatusCode::CREATED,
        Json(json!({ "notif_id": notif_id, "status": "enregistree" })),
    )
}
