// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use study_planner::config::Config;
use study_planner::db::{FirestoreDb, MemoryDb};
use study_planner::middleware::auth::issue_dev_token;
use study_planner::routes::create_router;
use study_planner::services::{
    AgentClient, FirebaseTokenVerifier, MetadataKeys, TimetableWorkflow,
};
use study_planner::AppState;

/// Agent address with nothing listening.
#[allow(dead_code)]
pub const UNREACHABLE_AGENT: &str = "http://127.0.0.1:9";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Router plus handles tests use to inspect side effects.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub db: Arc<MemoryDb>,
}

/// Create a test app backed by an in-memory store, talking to the agent at
/// `agent_url`.
#[allow(dead_code)]
pub fn create_test_app(agent_url: &str) -> TestApp {
    let config = Config::test_default();
    let db = Arc::new(MemoryDb::new());

    let identity = FirebaseTokenVerifier::from_config(&config).unwrap();
    let agent = AgentClient::new(agent_url, config.agent_timeout).unwrap();
    let workflow = TimetableWorkflow::new(db.clone(), agent, MetadataKeys::default());

    let state = Arc::new(AppState {
        config,
        db: db.clone(),
        identity,
        workflow,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
    }
}

/// Create a dev ID token for `uid` accepted by the test app.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, config: &Config) -> String {
    let key = config
        .auth_dev_signing_key
        .as_deref()
        .expect("test config has a dev key");
    issue_dev_token(
        uid,
        Some(&format!("{uid}@example.com")),
        &config.firebase_project_id,
        key,
    )
    .unwrap()
}

/// Build a JSON request with a bearer token.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a bodyless request with a bearer token.
#[allow(dead_code)]
pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// What the mock agent answers with.
#[derive(Clone)]
pub struct AgentReply {
    pub status: StatusCode,
    pub body: Value,
}

#[allow(dead_code)]
impl AgentReply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn error(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }
}

#[derive(Clone)]
struct MockAgentState {
    generate: AgentReply,
    realign: AgentReply,
    calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
    last_auth: Arc<Mutex<Option<String>>>,
}

/// AI agent stand-in served on an ephemeral local port.
#[allow(dead_code)]
pub struct MockAgent {
    pub base_url: String,
    calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
    last_auth: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl MockAgent {
    pub async fn start(generate: AgentReply, realign: AgentReply) -> Self {
        let state = MockAgentState {
            generate,
            realign,
            calls: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::new(Mutex::new(None)),
            last_auth: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/schedule/generate", post(mock_generate))
            .route("/schedule/realign", post(mock_realign))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            calls: state.calls,
            last_body: state.last_body,
            last_auth: state.last_auth,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap().clone()
    }

    pub fn last_auth(&self) -> Option<String> {
        self.last_auth.lock().unwrap().clone()
    }
}

async fn mock_generate(
    State(state): State<MockAgentState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let reply = state.generate.clone();
    record(&state, &headers, body);
    (reply.status, Json(reply.body))
}

async fn mock_realign(
    State(state): State<MockAgentState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let reply = state.realign.clone();
    record(&state, &headers, body);
    (reply.status, Json(reply.body))
}

fn record(state: &MockAgentState, headers: &HeaderMap, body: Value) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = Some(body);
    *state.last_auth.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
}

/// Wait briefly so timestamps taken before and after differ.
#[allow(dead_code)]
pub async fn tick() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}
