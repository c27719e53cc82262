//! In-process stand-in for the marketplace backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use ai_mall_client::models::{AuthenticatedUser, Role};
use ai_mall_client::storage::{SessionStore, SharedStorage};
use ai_mall_client::{ApiClient, ClientConfig};

#[derive(Default)]
pub struct BackendState {
    /// Authorization header seen per request path, in arrival order.
    pub auth_headers: Vec<(String, Option<String>)>,
    pub sessions: Vec<Value>,
    pub session_messages: HashMap<String, Vec<Value>>,
    pub deleted_sessions: Vec<String>,
    pub chat_requests: Vec<Value>,
    pub fail_chat: bool,
    pub vendor_history: Vec<Value>,
    pub admin_unauthorized: bool,
    pub admin_calls: usize,
    pub notifications: Vec<Value>,
    pub fail_notifications: bool,
    pub fail_mark_read: bool,
    pub fail_delete_notification: bool,
    /// Agent management calls as `"<METHOD> <path>"` with the JSON body (null when none).
    pub agent_calls: Vec<(String, Value)>,
    pub report_messages: Vec<Value>,
    next_id: usize,
}

type Shared = Arc<Mutex<BackendState>>;

pub struct MockBackend {
    pub base_url: String,
    state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Shared::default();
        let app = Router::new()
            .route("/agents", get(list_agents).post(create_agent))
            .route("/agents/{id}", get(get_agent).put(update_agent).delete(delete_agent))
            .route("/agents/buy/{id}", post(buy_agent))
            .route("/agents/{id}/submit-review", post(submit_for_review))
            .route("/agents/{id}/approve", post(approve_agent))
            .route("/agents/{id}/reject", post(reject_agent))
            .route("/auth/login", post(login))
            .route("/auth/signup", post(signup))
            .route("/email_varification", post(verify_email))
            .route("/user", get(profile).put(update_profile))
            .route("/chat", post(chat))
            .route("/chat/sessions", get(list_sessions).post(create_session))
            .route("/chat/sessions/{id}", get(get_session).delete(delete_session))
            .route("/messages/history", get(vendor_history))
            .route("/messages/all", get(all_vendor_chats))
            .route("/notifications", get(notifications))
            .route("/notifications/{id}", delete(delete_notification))
            .route("/notifications/{id}/read", put(mark_read))
            .route("/reports/{id}/messages", get(report_messages).post(post_report_message))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url: format!("http://{addr}"), state }
    }

    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    pub fn config(&self, dir: &TempDir) -> ClientConfig {
        ClientConfig {
            api_base_url: self.base_url.clone(),
            data_dir: dir.path().to_path_buf(),
            chat_poll_interval: Duration::from_millis(100),
            notification_poll_interval: Duration::from_millis(100),
            inbox_poll_interval: Duration::from_millis(100),
            report_poll_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// A client with its own storage directory.
    pub fn client(&self, dir: &TempDir) -> (ClientConfig, ApiClient) {
        let config = self.config(dir);
        let session = SessionStore::new(SharedStorage::open(dir.path()).unwrap());
        let api = ApiClient::new(&config, session).unwrap();
        (config, api)
    }
}

pub fn user(role: Role, token: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        id: "u1".into(),
        name: "Ada".into(),
        email: "ada@example.com".into(),
        role,
        token: Some(token.into()),
        avatar: None,
    }
}

pub fn chat_message(id: &str, role: &str, content: &str, timestamp_ms: i64) -> Value {
    json!({ "id": id, "role": role, "content": content, "timestamp": timestamp_ms })
}

/// Polls `condition` for up to two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn record(state: &Shared, path: &str, headers: &HeaderMap) {
    state.lock().unwrap().auth_headers.push((path.to_string(), bearer(headers)));
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn list_agents(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, "/agents", &headers);
    Json(json!([
        { "_id": "a1", "agentName": "Tutor", "description": "Homework help", "category": "education" },
        { "_id": "a2", "name": "Chef", "description": "Recipes" }
    ]))
}

fn agent(id: &str, status: &str) -> Value {
    json!({
        "_id": id,
        "agentName": "Tutor",
        "description": "Homework help",
        "status": status,
        "avatar": format!("https://cdn.example.com/{id}.png")
    })
}

fn log_agent_call(state: &Shared, call: String, body: Value) {
    state.lock().unwrap().agent_calls.push((call, body));
}

async fn get_agent(Path(id): Path<String>) -> Response {
    if id == "a-broken" {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Agent store unavailable");
    }
    Json(agent(&id, "active")).into_response()
}

async fn create_agent(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    log_agent_call(&state, "POST /agents".into(), body);
    Json(agent("a-new", "draft"))
}

async fn update_agent(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    log_agent_call(&state, format!("PUT /agents/{id}"), body);
    Json(agent(&id, "draft"))
}

async fn delete_agent(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    log_agent_call(&state, format!("DELETE /agents/{id}"), Value::Null);
    StatusCode::NO_CONTENT
}

async fn buy_agent(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    log_agent_call(&state, format!("POST /agents/buy/{id}"), body);
    Json(json!({ "message": "Purchased" }))
}

async fn submit_for_review(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    log_agent_call(&state, format!("POST /agents/{id}/submit-review"), Value::Null);
    Json(agent(&id, "pending_review"))
}

async fn approve_agent(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    log_agent_call(&state, format!("POST /agents/{id}/approve"), body);
    Json(agent(&id, "approved"))
}

async fn reject_agent(State(state): State<Shared>, Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    log_agent_call(&state, format!("POST /agents/{id}/reject"), body);
    Json(agent(&id, "rejected"))
}

/// Signup answers before verification, so no token yet.
async fn signup(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "message": "Verification code sent",
        "_id": "u9",
        "name": body["name"],
        "email": body["email"],
        "role": "user"
    }))
}

async fn verify_email(Json(body): Json<Value>) -> Response {
    if body["code"] != "123456" {
        return error(StatusCode::BAD_REQUEST, "Invalid code");
    }
    Json(json!({
        "message": "Email verified",
        "_id": "u9",
        "name": "Grace",
        "email": body["email"],
        "role": "user",
        "token": "tok-9"
    }))
    .into_response()
}

/// Echoes the new name; like the real backend, the token is not repeated.
async fn update_profile(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if bearer(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Sign in required");
    }
    Json(json!({ "_id": "u1", "name": body["name"], "email": "ada@example.com", "role": "user" })).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return error(StatusCode::BAD_REQUEST, "Invalid credentials");
    }
    Json(json!({
        "message": "Welcome back",
        "_id": "u1",
        "name": "Ada",
        "email": body["email"],
        "role": "user",
        "token": "tok-1"
    }))
    .into_response()
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    record(&state, "/user", &headers);
    match bearer(&headers).as_deref() {
        Some("Bearer tok-1") => {
            Json(json!({ "_id": "u1", "name": "Ada", "email": "ada@example.com", "role": "user" })).into_response()
        }
        _ => error(StatusCode::UNAUTHORIZED, "Token expired"),
    }
}

async fn list_sessions(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(state.lock().unwrap().sessions.clone()))
}

async fn create_session(State(state): State<Shared>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let id = format!("s-new-{}", state.next_id);
    state.sessions.insert(0, json!({ "sessionId": id, "title": null }));
    state.session_messages.insert(id.clone(), Vec::new());
    Json(json!({ "sessionId": id }))
}

async fn get_session(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock().unwrap();
    match state.session_messages.get(&id) {
        Some(messages) => Json(json!({ "sessionId": id, "messages": messages })).into_response(),
        None => error(StatusCode::NOT_FOUND, "Session not found"),
    }
}

async fn delete_session(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    let mut state = state.lock().unwrap();
    state.sessions.retain(|s| s["sessionId"] != id.as_str());
    state.session_messages.remove(&id);
    state.deleted_sessions.push(id);
    StatusCode::NO_CONTENT
}

async fn chat(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.chat_requests.push(body.clone());
    if state.fail_chat {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Model unavailable");
    }

    let session_id = body["sessionId"].as_str().unwrap_or_default().to_string();
    let content = body["content"].as_str().unwrap_or_default().to_string();
    let now = chrono::Utc::now().timestamp_millis();
    state.next_id += 1;
    let n = state.next_id;
    let reply = format!("Echo: {content}");
    let thread = state.session_messages.entry(session_id).or_default();
    thread.push(chat_message(&format!("srv-{n}-u"), "user", &content, now));
    thread.push(chat_message(&format!("srv-{n}-m"), "model", &reply, now + 1));
    Json(json!({ "reply": reply })).into_response()
}

async fn vendor_history(State(state): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Response {
    for key in ["userId", "vendorId", "agentId"] {
        if !params.contains_key(key) {
            return error(StatusCode::BAD_REQUEST, "missing thread key");
        }
    }
    let records = state.lock().unwrap().vendor_history.clone();
    Json(json!({ "success": true, "data": records })).into_response()
}

async fn all_vendor_chats(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.admin_calls += 1;
    if state.admin_unauthorized {
        return error(StatusCode::UNAUTHORIZED, "Not authorized");
    }
    Json(json!({ "success": true, "data": state.vendor_history })).into_response()
}

async fn notifications(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if bearer(&headers).is_none() {
        return error(StatusCode::UNAUTHORIZED, "Sign in required");
    }
    let state = state.lock().unwrap();
    if state.fail_notifications {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    Json(Value::Array(state.notifications.clone())).into_response()
}

async fn delete_notification(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_delete_notification {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    state.notifications.retain(|n| n["_id"] != id.as_str());
    StatusCode::NO_CONTENT.into_response()
}

async fn mark_read(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    if state.fail_mark_read {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    for n in state.notifications.iter_mut() {
        if n["_id"] == id.as_str() {
            n["isRead"] = json!(true);
        }
    }
    Json(json!({ "message": "ok" })).into_response()
}

async fn report_messages(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(state.lock().unwrap().report_messages.clone()))
}

async fn post_report_message(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if id == "closed" {
        return error(StatusCode::BAD_REQUEST, "Report is closed");
    }
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let stored = json!({
        "_id": format!("rm-{}", state.next_id),
        "message": body["message"],
        "senderRole": "user",
        "createdAt": chrono::Utc::now().to_rfc3339(),
    });
    state.report_messages.push(stored.clone());
    Json(stored).into_response()
}
