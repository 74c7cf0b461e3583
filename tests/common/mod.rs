//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;

use rollout_controller::config::RolloutConfig;
use rollout_controller::flags::types::{FeatureDefinition, FeatureSummary, ToggleCount};
use rollout_controller::flags::{FlagError, FlagResult, FlagSource};
use rollout_controller::load_balancer::{
    BackendGroup, BalancerAdapter, BalancerError, BalancerResult, Server, Weight,
};

pub const PREFIX: &str = "kubernetes.loadbalance.legacy.";

/// Config tuned for tests: no refetch throttling, default pool suffixes.
pub fn test_config() -> RolloutConfig {
    let mut config = RolloutConfig::default();
    config.flags.min_refetch_secs = 0;
    config.controller.tick_interval_secs = 1;
    config
}

pub fn feature_name(app: &str) -> String {
    format!("{}{}", PREFIX, app)
}

pub fn host_weight(value: &str) -> serde_json::Value {
    serde_json::json!({
        "enabled": true,
        "strategies": [{ "name": "kubernetesLegacyHost", "parameters": { "legacy-weight": value } }]
    })
}

// ---------------------------------------------------------------------------
// In-memory balancer
// ---------------------------------------------------------------------------

/// Balancer held in memory that records every weight change.
#[derive(Default)]
pub struct MemoryBalancer {
    groups: Mutex<Vec<BackendGroup>>,
    calls: Mutex<Vec<(String, String, u8)>>,
    unreachable: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryBalancer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_group(&self, name: &str, servers: &[(&str, u32)]) {
        let mut group = BackendGroup::new(name);
        group.servers = servers.iter().map(|(n, w)| Server::new(*n, *w)).collect();
        self.groups.lock().unwrap().push(group);
    }

    /// Standard layout for `app`: one routing group holding two servers per
    /// pool, plus the two pool groups carrying counters.
    pub fn add_app(&self, app: &str, legacy_weight: u32) {
        let legacy = format!("{}-legacy", app);
        let new = format!("{}-kubernetes", app);
        self.add_group(
            app,
            &[
                (&format!("{}-1", legacy), legacy_weight),
                (&format!("{}-2", legacy), legacy_weight),
                (&format!("{}-1", new), 100 - legacy_weight),
                (&format!("{}-2", new), 100 - legacy_weight),
            ],
        );
        self.add_group(&legacy, &[(&format!("{}-1", legacy), 1)]);
        self.add_group(&new, &[(&format!("{}-1", new), 1)]);
    }

    pub fn set_counter(&self, group: &str, counter: &str, value: u64) {
        let mut groups = self.groups.lock().unwrap();
        if let Some(g) = groups.iter_mut().find(|g| g.name == group) {
            g.counters.insert(counter.to_string(), value);
        }
    }

    pub fn weight(&self, group: &str, server: &str) -> Option<u32> {
        let groups = self.groups.lock().unwrap();
        groups
            .iter()
            .find(|g| g.name == group)?
            .servers
            .iter()
            .find(|s| s.name == server)
            .map(|s| s.weight)
    }

    pub fn calls(&self) -> Vec<(String, String, u8)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, Ordering::SeqCst);
    }

    /// Number of snapshots served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalancerAdapter for MemoryBalancer {
    async fn groups(&self) -> BalancerResult<Vec<BackendGroup>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(BalancerError::Timeout("memory".to_string()));
        }
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn set_weight(&self, backend: &str, server: &str, weight: Weight) -> BalancerResult<()> {
        let mut groups = self.groups.lock().unwrap();
        let target = groups
            .iter_mut()
            .find(|g| g.name == backend)
            .and_then(|g| g.servers.iter_mut().find(|s| s.name == server))
            .ok_or_else(|| BalancerError::NotFound(format!("{}/{}", backend, server)))?;
        target.weight = u32::from(weight.get());
        self.calls
            .lock()
            .unwrap()
            .push((backend.to_string(), server.to_string(), weight.get()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory flag source
// ---------------------------------------------------------------------------

/// One usage report as received by [`MemoryFlags`].
#[derive(Debug, Clone)]
pub struct ReceivedReport {
    pub feature: String,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub counts: ToggleCount,
}

/// Flag source held in memory.
#[derive(Default)]
pub struct MemoryFlags {
    features: Mutex<HashMap<String, serde_json::Value>>,
    listing: Mutex<Vec<FeatureSummary>>,
    reports: Mutex<Vec<ReceivedReport>>,
    fail_reports: AtomicBool,
    pub fetches: AtomicUsize,
}

impl MemoryFlags {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Set an app's feature definition and list it as enabled.
    pub fn set_app(&self, app: &str, definition: serde_json::Value) {
        let name = feature_name(app);
        let enabled = definition["enabled"].as_bool().unwrap_or(false);
        self.features.lock().unwrap().insert(name.clone(), definition);
        let mut listing = self.listing.lock().unwrap();
        listing.retain(|f| f.name != name);
        listing.push(FeatureSummary { name, enabled });
    }

    pub fn list_raw(&self, name: &str, enabled: bool) {
        self.listing.lock().unwrap().push(FeatureSummary { name: name.to_string(), enabled });
    }

    pub fn remove_app(&self, app: &str) {
        let name = feature_name(app);
        self.features.lock().unwrap().remove(&name);
        self.listing.lock().unwrap().retain(|f| f.name != name);
    }

    pub fn reports(&self) -> Vec<ReceivedReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn reports_for(&self, app: &str) -> Vec<ToggleCount> {
        let name = feature_name(app);
        self.reports().into_iter().filter(|r| r.feature == name).map(|r| r.counts).collect()
    }

    pub fn set_fail_reports(&self, value: bool) {
        self.fail_reports.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl FlagSource for MemoryFlags {
    async fn fetch_feature(&self, name: &str) -> FlagResult<FeatureDefinition> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let features = self.features.lock().unwrap();
        let body = features.get(name).cloned().ok_or_else(|| FlagError::Status {
            status: 404,
            path: format!("features/{}", name),
        })?;
        serde_json::from_value(body).map_err(|e| FlagError::Decode {
            path: format!("features/{}", name),
            reason: e.to_string(),
        })
    }

    async fn list_features(&self) -> FlagResult<Vec<FeatureSummary>> {
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn register(&self, _strategies: Vec<String>, _interval: Duration) -> FlagResult<()> {
        Ok(())
    }

    async fn send_metrics(
        &self,
        feature: &str,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        counts: ToggleCount,
    ) -> FlagResult<()> {
        if self.fail_reports.load(Ordering::SeqCst) {
            return Err(FlagError::Status { status: 500, path: "client/metrics".to_string() });
        }
        self.reports.lock().unwrap().push(ReceivedReport {
            feature: feature.to_string(),
            start,
            stop,
            counts,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// HTTP flag API mock
// ---------------------------------------------------------------------------

/// A request as seen by the mock flag API.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: &'static str,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Option<serde_json::Value>,
}

#[derive(Default)]
pub struct MockState {
    features: Mutex<HashMap<String, String>>,
    listing: Mutex<serde_json::Value>,
    requests: Mutex<Vec<SeenRequest>>,
    forced_status: Mutex<Option<u16>>,
}

impl MockState {
    pub fn set_feature(&self, name: &str, body: serde_json::Value) {
        self.features.lock().unwrap().insert(name.to_string(), body.to_string());
    }

    pub fn set_raw_feature(&self, name: &str, body: &str) {
        self.features.lock().unwrap().insert(name.to_string(), body.to_string());
    }

    pub fn set_listing(&self, body: serde_json::Value) {
        *self.listing.lock().unwrap() = body;
    }

    /// Answer every request with `status` until cleared.
    pub fn force_status(&self, status: Option<u16>) {
        *self.forced_status.lock().unwrap() = status;
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method && r.path == path).count()
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Option<&Bytes>) {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = body.and_then(|b| serde_json::from_slice(b).ok());
        self.requests.lock().unwrap().push(SeenRequest { method, path, content_type, body });
    }

    fn forced(&self) -> Option<Response> {
        let status = (*self.forced_status.lock().unwrap())?;
        Some(StatusCode::from_u16(status).unwrap().into_response())
    }
}

type Shared = Arc<MockState>;

async fn get_listing(State(state): State<Shared>, headers: HeaderMap) -> Response {
    state.record("GET", "features/".to_string(), &headers, None);
    if let Some(forced) = state.forced() {
        return forced;
    }
    let body = state.listing.lock().unwrap().to_string();
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn get_feature(
    State(state): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.record("GET", format!("features/{}", name), &headers, None);
    if let Some(forced) = state.forced() {
        return forced;
    }
    let body = state.features.lock().unwrap().get(&name).cloned();
    match body {
        Some(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn post_register(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    state.record("POST", "client/register".to_string(), &headers, Some(&body));
    state.forced().unwrap_or_else(|| StatusCode::ACCEPTED.into_response())
}

async fn post_metrics(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    state.record("POST", "client/metrics".to_string(), &headers, Some(&body));
    state.forced().unwrap_or_else(|| StatusCode::ACCEPTED.into_response())
}

/// Mock flag API served on an ephemeral port under `/api`.
pub struct MockFlagServer {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockFlagServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(MockState::default());
        state.set_listing(serde_json::json!({ "features": [] }));

        let app = Router::new()
            .route("/api/features/", get(get_listing))
            .route("/api/features/{name}", get(get_feature))
            .route("/api/client/register", post(post_register))
            .route("/api/client/metrics", post(post_metrics))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}
