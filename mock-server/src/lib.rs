use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const APP_KEY: &str = "app-key";
pub const MASTER_SECRET: &str = "master-secret";

/// Device record kept by the mock device endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Device {
    #[serde(default)]
    pub tags: Vec<String>,
    pub alias: Option<String>,
    pub mobile: Option<String>,
}

/// Shared server state. Counters are public so tests can assert how many
/// times a route was hit.
#[derive(Debug)]
pub struct MockState {
    pub app_key: String,
    pub master_secret: String,
    /// How long `/slow` and the failing phase of `/flaky` sleep.
    pub delay: Duration,
    pub slow_hits: AtomicUsize,
    pub flaky_hits: AtomicUsize,
    /// Number of `/flaky` requests that stall before it starts answering.
    pub flaky_failures: usize,
    pub devices: RwLock<HashMap<String, Device>>,
    pub schedules: RwLock<HashMap<String, Value>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            app_key: APP_KEY.to_string(),
            master_secret: MASTER_SECRET.to_string(),
            delay: Duration::from_secs(2),
            slow_hits: AtomicUsize::new(0),
            flaky_hits: AtomicUsize::new(0),
            flaky_failures: 2,
            devices: RwLock::new(HashMap::new()),
            schedules: RwLock::new(HashMap::new()),
        }
    }
}

pub type Shared = Arc<MockState>;

pub fn app() -> Router {
    app_with_state(Arc::new(MockState::default()))
}

pub fn app_with_state(state: Shared) -> Router {
    let api = Router::new()
        .route("/v3/push", post(push))
        .route("/v3/devices/{registration_id}", get(get_device).post(update_device))
        .route("/v3/aliases/{alias}", get(get_alias).delete(delete_alias))
        .route("/v3/schedules/{schedule_id}", put(update_schedule))
        .route("/v3/received", get(received))
        .route("/echo", any(echo))
        .route("/slow", any(slow))
        .route("/flaky", any(flaky))
        .route("/error", any(error))
        .layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

    api.with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: Shared) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn api_error(status: StatusCode, code: u32, message: &str) -> Response {
    (status, Json(json!({"error": {"code": code, "message": message}}))).into_response()
}

async fn require_basic_auth(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let expected = format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", state.app_key, state.master_secret))
    );
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        tracing::debug!(uri = %request.uri(), "rejecting unauthenticated request");
        return api_error(StatusCode::UNAUTHORIZED, 1004, "Authen failed");
    }
    next.run(request).await
}

async fn push(Json(payload): Json<Value>) -> Response {
    if payload.get("platform").is_none() || payload.get("audience").is_none() {
        return api_error(StatusCode::BAD_REQUEST, 1003, "Missing parameter");
    }
    let sendno = match payload.pointer("/options/sendno") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "0".to_string(),
    };
    Json(json!({"sendno": sendno, "msg_id": Uuid::new_v4().simple().to_string()})).into_response()
}

async fn get_device(State(state): State<Shared>, Path(registration_id): Path<String>) -> Json<Device> {
    let devices = state.devices.read().await;
    Json(devices.get(&registration_id).cloned().unwrap_or_default())
}

#[derive(Deserialize)]
pub struct DeviceUpdate {
    pub tags: Option<TagUpdate>,
    pub alias: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Deserialize)]
pub struct TagUpdate {
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
}

async fn update_device(
    State(state): State<Shared>,
    Path(registration_id): Path<String>,
    Json(input): Json<DeviceUpdate>,
) -> StatusCode {
    let mut devices = state.devices.write().await;
    let device = devices.entry(registration_id).or_default();
    if let Some(tags) = input.tags {
        device.tags.retain(|t| !tags.remove.contains(t));
        for tag in tags.add {
            if !device.tags.contains(&tag) {
                device.tags.push(tag);
            }
        }
    }
    if input.alias.is_some() {
        device.alias = input.alias;
    }
    if input.mobile.is_some() {
        device.mobile = input.mobile;
    }
    StatusCode::OK
}

async fn get_alias(State(state): State<Shared>, Path(alias): Path<String>) -> Json<Value> {
    let devices = state.devices.read().await;
    let registration_ids: Vec<&String> = devices
        .iter()
        .filter(|(_, d)| d.alias.as_deref() == Some(alias.as_str()))
        .map(|(id, _)| id)
        .collect();
    Json(json!({"registration_ids": registration_ids}))
}

async fn delete_alias(State(state): State<Shared>, Path(alias): Path<String>) -> StatusCode {
    let mut devices = state.devices.write().await;
    let mut found = false;
    for device in devices.values_mut() {
        if device.alias.as_deref() == Some(alias.as_str()) {
            device.alias = None;
            found = true;
        }
    }
    if found {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn update_schedule(
    State(state): State<Shared>,
    Path(schedule_id): Path<String>,
    Json(input): Json<Value>,
) -> Response {
    let Value::Object(mut schedule) = input else {
        return api_error(StatusCode::BAD_REQUEST, 1003, "schedule must be an object");
    };
    schedule.insert("schedule_id".to_string(), Value::String(schedule_id.clone()));
    let schedule = Value::Object(schedule);
    state.schedules.write().await.insert(schedule_id, schedule.clone());
    Json(schedule).into_response()
}

async fn received(Query(query): Query<HashMap<String, String>>) -> Response {
    let Some(msg_ids) = query.get("msg_ids") else {
        return api_error(StatusCode::BAD_REQUEST, 1003, "msg_ids is required");
    };
    let report: Vec<Value> = msg_ids
        .split(',')
        .filter(|id| !id.is_empty())
        .map(|id| json!({"msg_id": id, "android_received": 0, "ios_apns_sent": 0}))
        .collect();
    Json(report).into_response()
}

/// Reflects the request back so clients can inspect what went over the wire.
async fn echo(method: Method, headers: HeaderMap, request_uri: axum::http::Uri, body: Bytes) -> Json<Value> {
    let headers: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    Json(json!({
        "method": method.as_str(),
        "path": request_uri.path(),
        "query": request_uri.query(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn slow(State(state): State<Shared>) -> StatusCode {
    state.slow_hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.delay).await;
    StatusCode::OK
}

async fn flaky(State(state): State<Shared>) -> Response {
    let hit = state.flaky_hits.fetch_add(1, Ordering::SeqCst);
    if hit < state.flaky_failures {
        tokio::time::sleep(state.delay).await;
    }
    Json(json!({"ok": true, "attempt": hit + 1})).into_response()
}

async fn error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}
