//! In-process fake of the Elder API for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use elder_console::elder::ElderClient;
use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";

#[derive(Debug, Default)]
pub struct Recorded {
  /// Every request as "METHOD path?query"
  pub requests: Vec<String>,
  pub authorization: Vec<Option<String>>,
  pub dependencies: Vec<Value>,
  pub deleted: Vec<i64>,
  pub restore_bodies: Vec<Value>,
}

pub type Shared = Arc<Mutex<Recorded>>;

pub struct FakeElder {
  pub base_url: String,
  pub state: Shared,
}

impl FakeElder {
  pub async fn start() -> Self {
    let state: Shared = Arc::default();
    let app = Router::new()
      .route("/healthz", get(health))
      .route("/api/v1/profile", get(profile))
      .route("/api/v1/organizations", get(organizations))
      .route("/api/v1/organizations/search", get(organizations))
      .route("/api/v1/labels", get(broken_labels))
      .route("/api/v1/logs", get(logs))
      .route("/api/v1/logs/search", get(logs))
      .route("/api/v1/dependencies", get(list_dependencies).post(create_dependency))
      .route("/api/v1/entities/:id", delete(delete_entity))
      .route("/api/v1/backup/:id/restore", post(restore))
      .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    Self {
      base_url: format!("http://{}", addr),
      state,
    }
  }

  pub fn client(&self) -> ElderClient {
    ElderClient::with_base(&self.base_url, Some(TOKEN.to_string()), Duration::from_secs(5)).unwrap()
  }

  pub fn anonymous_client(&self) -> ElderClient {
    ElderClient::with_base(&self.base_url, None, Duration::from_secs(5)).unwrap()
  }

  pub fn requests(&self) -> Vec<String> {
    self.state.lock().unwrap().requests.clone()
  }

  /// Number of recorded requests whose line starts with `prefix`.
  pub fn count(&self, prefix: &str) -> usize {
    self
      .requests()
      .iter()
      .filter(|r| r.starts_with(prefix))
      .count()
  }
}

fn record(state: &Shared, line: String, headers: &HeaderMap) {
  let mut s = state.lock().unwrap();
  s.requests.push(line);
  s.authorization.push(
    headers
      .get("authorization")
      .and_then(|v| v.to_str().ok())
      .map(String::from),
  );
}

fn query_line(method: &str, path: &str, params: &HashMap<String, String>) -> String {
  let mut pairs: Vec<_> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
  pairs.sort();
  if pairs.is_empty() {
    format!("{} {}", method, path)
  } else {
    format!("{} {}?{}", method, path, pairs.join("&"))
  }
}

fn authorized(headers: &HeaderMap) -> bool {
  headers
    .get("authorization")
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn health(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
  record(&state, "GET /healthz".into(), &headers);
  Json(json!({"status": "healthy", "service": "elder"}))
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
  record(&state, "GET /api/v1/profile".into(), &headers);
  if !authorized(&headers) {
    return (
      StatusCode::UNAUTHORIZED,
      Json(json!({"error": "Authentication required"})),
    )
      .into_response();
  }
  Json(json!({
    "id": 1,
    "username": "admin",
    "email": "admin@example.com",
    "role": "admin",
    "is_superuser": false
  }))
  .into_response()
}

async fn organizations(
  State(state): State<Shared>,
  headers: HeaderMap,
  uri: Uri,
  Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
  record(&state, query_line("GET", uri.path(), &params), &headers);
  let name = match params.get("q") {
    Some(q) => format!("{} Corp", q),
    None => "Acme".to_string(),
  };
  Json(json!({
    "items": [{"id": 7, "name": name, "description": null}],
    "total": 120,
    "page": params.get("page").and_then(|p| p.parse::<u64>().ok()).unwrap_or(1),
  }))
}

async fn broken_labels(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
  record(&state, "GET /api/v1/labels".into(), &headers);
  Json(json!({"total": 3}))
}

async fn list_dependencies(
  State(state): State<Shared>,
  headers: HeaderMap,
  Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
  record(&state, query_line("GET", "/api/v1/dependencies", &params), &headers);
  let s = state.lock().unwrap();
  Json(json!({"items": s.dependencies, "total": s.dependencies.len()}))
}

async fn create_dependency(
  State(state): State<Shared>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Response {
  record(&state, "POST /api/v1/dependencies".into(), &headers);
  if body["source_entity_id"] == body["target_entity_id"] {
    return (
      StatusCode::BAD_REQUEST,
      Json(json!({"error": "Source and target entity must be different"})),
    )
      .into_response();
  }
  let mut s = state.lock().unwrap();
  let created = json!({
    "id": s.dependencies.len() as i64 + 1,
    "source_entity_id": body["source_entity_id"],
    "target_entity_id": body["target_entity_id"],
    "dependency_type": body["dependency_type"],
  });
  s.dependencies.push(created.clone());
  (StatusCode::CREATED, Json(created)).into_response()
}

async fn delete_entity(
  State(state): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
) -> Response {
  record(&state, format!("DELETE /api/v1/entities/{}", id), &headers);
  if id == 404 {
    return (StatusCode::NOT_FOUND, Json(json!({"message": "Entity not found"}))).into_response();
  }
  state.lock().unwrap().deleted.push(id);
  StatusCode::NO_CONTENT.into_response()
}

async fn restore(
  State(state): State<Shared>,
  headers: HeaderMap,
  Path(id): Path<i64>,
  Json(body): Json<Value>,
) -> Json<Value> {
  record(&state, format!("POST /api/v1/backup/{}/restore", id), &headers);
  let dry_run = body["dry_run"].as_bool().unwrap_or(false);
  state.lock().unwrap().restore_bodies.push(body);
  Json(json!({"dry_run": dry_run, "message": "Restore planned", "tables": 12}))
}

async fn logs(
  State(state): State<Shared>,
  headers: HeaderMap,
  uri: Uri,
  Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
  record(&state, query_line("GET", uri.path(), &params), &headers);
  match params.get("q") {
    Some(q) => Json(json!({
      "lines": [format!("ERROR worker: {} in sync job", q)],
      "total_matches": 1,
      "query": q,
    })),
    None => Json(json!({
      "lines": ["INFO started", "INFO sync job finished"],
      "total": 2,
      "log_file": "elder.log",
    })),
  }
}
