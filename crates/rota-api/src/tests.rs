//! Router tests driven through `tower::ServiceExt::oneshot` against an
//! in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use rota_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::api_router;

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  api_router(Arc::new(store))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json");
  let req = match body {
    Some(v) => req.body(Body::from(v.to_string())),
    None => req.body(Body::empty()),
  }
  .unwrap();

  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
  send(app, "POST", uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
  send(app, "GET", uri, None).await
}

fn members(ids: &[&str]) -> Value {
  ids
    .iter()
    .map(|id| json!({ "user_id": id, "username": id.to_uppercase(), "is_active": true }))
    .collect()
}

async fn seed_team(app: &Router, name: &str, ids: &[&str]) {
  let (status, _) = post(
    app,
    "/team/add",
    json!({ "team_name": name, "members": members(ids) }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

async fn create_pr(app: &Router, id: &str, author: &str) -> (StatusCode, Value) {
  post(
    app,
    "/pullRequest/create",
    json!({
      "pull_request_id": id,
      "pull_request_name": format!("{id} feature"),
      "author_id": author,
    }),
  )
  .await
}

fn error_code(body: &Value) -> &str { body["error"]["code"].as_str().unwrap_or_default() }

fn reviewers(pr: &Value) -> Vec<String> {
  pr["assigned_reviewers"]
    .as_array()
    .unwrap()
    .iter()
    .map(|v| v.as_str().unwrap().to_owned())
    .collect()
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_is_ok() {
  let app = app().await;
  let (status, body) = get(&app, "/health").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "ok" }));
}

// ─── Teams ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn team_add_and_get() {
  let app = app().await;
  let (status, body) = post(
    &app,
    "/team/add",
    json!({ "team_name": "core", "members": members(&["a", "b"]) }),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["team"]["team_name"], "core");
  assert_eq!(body["team"]["members"].as_array().unwrap().len(), 2);

  let (status, body) = get(&app, "/team/get?team_name=core").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["members"][0]["user_id"], "a");
  assert_eq!(body["members"][1]["is_active"], true);
}

#[tokio::test]
async fn team_add_twice_is_team_exists() {
  let app = app().await;
  seed_team(&app, "core", &["a"]).await;
  let (status, body) = post(
    &app,
    "/team/add",
    json!({ "team_name": "core", "members": members(&["b"]) }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "TEAM_EXISTS");
}

#[tokio::test]
async fn team_get_errors() {
  let app = app().await;
  let (status, body) = get(&app, "/team/get?team_name=ghost").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_code(&body), "NOT_FOUND");

  let (status, body) = get(&app, "/team/get").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "INVALID_REQUEST");
}

#[tokio::test]
async fn team_add_users_appends_members() {
  let app = app().await;
  seed_team(&app, "core", &["a"]).await;
  let (status, body) = post(
    &app,
    "/team/addUsers",
    json!({ "team_name": "core", "members": members(&["b", "a"]) }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let ids: Vec<_> = body["team"]["members"]
    .as_array()
    .unwrap()
    .iter()
    .map(|m| m["user_id"].as_str().unwrap())
    .collect();
  assert_eq!(ids, ["a", "b"]);

  let (status, _) = post(
    &app,
    "/team/addUsers",
    json!({ "team_name": "ghost", "members": members(&["c"]) }),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_invalid_request() {
  let app = app().await;
  let (status, body) = post(&app, "/team/add", json!({ "team_name": "core" })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "INVALID_REQUEST");

  let (status, body) = post(&app, "/team/add", json!({ "team_name": " ", "members": [] })).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "INVALID_REQUEST");
}

// ─── Bulk deactivation ───────────────────────────────────────────────────────

#[tokio::test]
async fn deactivate_users_reassigns_open_reviews() {
  let app = app().await;
  seed_team(&app, "core", &["a", "b", "c"]).await;
  // Only b and c are eligible, so both are assigned.
  let (_, body) = create_pr(&app, "pr1", "a").await;
  assert_eq!(reviewers(&body["pr"]), ["b", "c"]);

  post(
    &app,
    "/team/addUsers",
    json!({ "team_name": "core", "members": members(&["d"]) }),
  )
  .await;
  // Leave d as the only eligible replacement.
  post(&app, "/users/setIsActive", json!({ "user_id": "c", "is_active": false })).await;

  let (status, body) = post(
    &app,
    "/team/deactivateUsers",
    json!({ "team_name": "core", "user_ids": ["b", "z"] }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["deactivated_users"], json!(["b"]));
  assert_eq!(
    body["reassigned_prs"],
    json!([{ "pr_id": "pr1", "from_reviewer": "b", "to_reviewer": "d" }])
  );
  assert_eq!(body["errors"].as_array().unwrap().len(), 1);

  let (_, pr) = get(&app, "/pullRequest/get?pull_request_id=pr1").await;
  assert_eq!(reviewers(&pr), ["c", "d"]);
}

#[tokio::test]
async fn deactivate_users_validation() {
  let app = app().await;
  seed_team(&app, "core", &["a"]).await;

  let (status, body) = post(
    &app,
    "/team/deactivateUsers",
    json!({ "team_name": "core", "user_ids": [] }),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(error_code(&body), "INVALID_REQUEST");

  let (status, _) = post(
    &app,
    "/team/deactivateUsers",
    json!({ "team_name": "ghost", "user_ids": ["a"] }),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_is_active_returns_user_with_team() {
  let app = app().await;
  seed_team(&app, "core", &["a"]).await;

  let (status, body) = post(
    &app,
    "/users/setIsActive",
    json!({ "user_id": "a", "is_active": false }),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user"]["user_id"], "a");
  assert_eq!(body["user"]["is_active"], false);
  assert_eq!(body["user"]["team_name"], "core");

  let (status, body) = post(
    &app,
    "/users/setIsActive",
    json!({ "user_id": "ghost", "is_active": true }),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn get_review_lists_assigned_prs() {
  let app = app().await;
  seed_team(&app, "core", &["a", "b"]).await;
  create_pr(&app, "pr1", "a").await;

  let (status, body) = get(&app, "/users/getReview?user_id=b").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["user_id"], "b");
  assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr1");
  assert_eq!(body["pull_requests"][0]["status"], "OPEN");

  let (_, body) = get(&app, "/users/getReview?user_id=nobody").await;
  assert_eq!(body["pull_requests"], json!([]));

  let (status, _) = get(&app, "/users/getReview").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Pull requests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_pr_assigns_teammates() {
  let app = app().await;
  seed_team(&app, "core", &["a", "b", "c", "d"]).await;

  let (status, body) = create_pr(&app, "pr1", "a").await;
  assert_eq!(status, StatusCode::CREATED);
  let pr = &body["pr"];
  assert_eq!(pr["status"], "OPEN");
  assert!(pr["merged_at"].is_null());
  let assigned = reviewers(pr);
  assert_eq!(assigned.len(), 2);
  assert!(assigned.iter().all(|r| ["b", "c", "d"].contains(&r.as_str())));
}

#[tokio::test]
async fn create_pr_errors() {
  let app = app().await;
  seed_team(&app, "core", &["a", "b"]).await;
  create_pr(&app, "pr1", "a").await;

  let (status, body) = create_pr(&app, "pr1", "b").await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "PR_EXISTS");

  let (status, body) = create_pr(&app, "pr2", "ghost").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn reassign_flow() {
  let app = app().await;
  seed_team(&app, "core", &["a", "b", "c"]).await;
  create_pr(&app, "pr1", "a").await;

  let reassign = |old: &'static str| {
    json!({ "pull_request_id": "pr1", "old_reviewer_id": old })
  };

  let (status, body) = post(&app, "/pullRequest/reassign", reassign("b")).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "NO_CANDIDATE");

  post(
    &app,
    "/team/addUsers",
    json!({ "team_name": "core", "members": members(&["d"]) }),
  )
  .await;

  let (status, body) = post(&app, "/pullRequest/reassign", reassign("b")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["replaced_by"], "d");
  assert_eq!(reviewers(&body["pr"]), ["c", "d"]);

  let (status, body) = post(&app, "/pullRequest/reassign", reassign("b")).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&body), "NOT_ASSIGNED");
}

#[tokio::test]
async fn merge_is_idempotent_and_freezes_reviewers() {
  let app = app().await;
  seed_team(&app, "core", &["a", "b", "c", "d"]).await;
  create_pr(&app, "pr1", "a").await;

  let body = json!({ "pull_request_id": "pr1" });
  let (status, first) = post(&app, "/pullRequest/merge", body.clone()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["pr"]["status"], "MERGED");
  assert!(first["pr"]["merged_at"].is_string());

  let (status, second) = post(&app, "/pullRequest/merge", body).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(second["pr"]["merged_at"], first["pr"]["merged_at"]);

  let old = reviewers(&first["pr"]).remove(0);
  let (status, err) = post(
    &app,
    "/pullRequest/reassign",
    json!({ "pull_request_id": "pr1", "old_reviewer_id": old }),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(error_code(&err), "PR_MERGED");

  let (_, pr) = get(&app, "/pullRequest/get?pull_request_id=pr1").await;
  assert_eq!(reviewers(&pr), reviewers(&first["pr"]));

  let (status, _) = post(
    &app,
    "/pullRequest/merge",
    json!({ "pull_request_id": "ghost" }),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
