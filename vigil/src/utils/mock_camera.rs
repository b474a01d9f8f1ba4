use crate::devices::hardware::camera::IpCameraConfig;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// Token handed out by the mock on login.
pub const MOCK_TOKEN: &str = "b4bb4e5de8e4c49";

/// Scripted answers of the mock camera.
#[derive(Clone)]
pub struct MockCameraBehaviour {
    pub login_status: StatusCode,
    pub login_body: String,
    pub snapshot_status: StatusCode,
    pub snapshot_body: Vec<u8>,
    pub motion_status: StatusCode,
    /// Replies to `GetMdState`, cycled through one per call.
    pub motion_bodies: Vec<String>,
    /// Service time of each `GetMdState` call.
    pub motion_delay: Duration,
}

impl Default for MockCameraBehaviour {
    fn default() -> Self {
        Self {
            login_status: StatusCode::OK,
            login_body: format!(
                r#"[{{"cmd": "Login", "code": 0, "value": {{"Token": {{"leaseTime": 3600, "name": "{MOCK_TOKEN}"}}}}}}]"#
            ),
            snapshot_status: StatusCode::OK,
            // JPEG start of image marker followed by a JFIF header.
            snapshot_body: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00],
            motion_status: StatusCode::OK,
            motion_bodies: vec![motion_body(0)],
            motion_delay: Duration::ZERO,
        }
    }
}

impl MockCameraBehaviour {
    /// Reply to successive motion checks with these states.
    pub fn motion_states(mut self, states: &[i64]) -> Self {
        self.motion_bodies = states.iter().map(|state| motion_body(*state)).collect();
        self
    }
}

/// `GetMdState` reply carrying `state`.
pub fn motion_body(state: i64) -> String {
    format!(r#"[{{"cmd": "GetMdState", "code": 0, "value": {{"state": {state}}}}}]"#)
}

/// A request as seen by the mock.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    pub cookie: Option<String>,
    pub body: String,
}

struct MockState {
    behaviour: MockCameraBehaviour,
    motion_calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn record(
        &self,
        method: &str,
        path: &str,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: String,
    ) {
        let header_value = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(String::from)
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            query,
            content_type: header_value(header::CONTENT_TYPE),
            cookie: header_value(header::COOKIE),
            body,
        });
    }
}

/// Camera control endpoint served on an ephemeral loopback port for the
/// lifetime of the test runtime.
pub struct MockCamera {
    /// `host:port` the mock listens on.
    pub address: String,
    state: Arc<MockState>,
}

impl MockCamera {
    pub async fn start(behaviour: MockCameraBehaviour) -> Self {
        let state = Arc::new(MockState {
            behaviour,
            motion_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api.cgi", get(api_get).post(api_post))
            .route("/cgi-bin/api.cgi", get(snapshot))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock camera");
        let address = listener.local_addr().expect("No local address").to_string();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock camera stopped");
        });

        Self { address, state }
    }

    /// Config pointing at the mock with default credentials.
    pub fn config(&self) -> IpCameraConfig {
        IpCameraConfig::new(self.address.clone(), "admin", "")
            .with_request_timeout(Duration::from_secs(2))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn motion_calls(&self) -> usize {
        self.state.motion_calls.load(Ordering::SeqCst)
    }
}

async fn api_post(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let is_login = query.get("cmd").map(String::as_str) == Some("Login");
    state.record("POST", "/api.cgi", query, &headers, body);
    if is_login {
        (state.behaviour.login_status, state.behaviour.login_body.clone())
    } else {
        (StatusCode::BAD_REQUEST, String::from("[]"))
    }
}

async fn api_get(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let is_motion = query.get("cmd").map(String::as_str) == Some("GetMdState");
    state.record("GET", "/api.cgi", query, &headers, String::new());
    if !is_motion {
        return (StatusCode::BAD_REQUEST, String::from("[]"));
    }

    let call = state.motion_calls.fetch_add(1, Ordering::SeqCst);
    if !state.behaviour.motion_delay.is_zero() {
        tokio::time::sleep(state.behaviour.motion_delay).await;
    }
    let bodies = &state.behaviour.motion_bodies;
    let body = if bodies.is_empty() {
        String::from("[]")
    } else {
        bodies[call % bodies.len()].clone()
    };
    (state.behaviour.motion_status, body)
}

async fn snapshot(
    State(state): State<Arc<MockState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, Vec<u8>) {
    state.record("GET", "/cgi-bin/api.cgi", query, &headers, String::new());
    (state.behaviour.snapshot_status, state.behaviour.snapshot_body.clone())
}
