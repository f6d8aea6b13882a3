//! Handlers for `/pullRequest/*` endpoints.
//!
//! Reviewer selection draws from a fresh OS-seeded [`StdRng`] per request.

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use rand::{SeedableRng, rngs::StdRng};
use rota_core::{
  assign::{self, Reassignment},
  pull_request::{NewPullRequest, PullRequest},
  store::ReviewStore,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, require_non_empty};

#[derive(Debug, Serialize)]
pub struct PrResponse {
  pub pr: PullRequest,
}

#[derive(Debug, Deserialize)]
pub struct PrIdBody {
  pub pull_request_id: String,
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /pullRequest/create`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReviewStore,
{
  let Json(body) = payload?;
  require_non_empty("pull_request_id", &body.pull_request_id)?;
  require_non_empty("pull_request_name", &body.pull_request_name)?;
  require_non_empty("author_id", &body.author_id)?;

  let mut rng = StdRng::from_os_rng();
  let pr = assign::create_pull_request(store.as_ref(), body, &mut rng).await?;
  Ok((StatusCode::CREATED, Json(PrResponse { pr })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GetParams {
  pub pull_request_id: String,
}

/// `GET /pullRequest/get?pull_request_id=<id>`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<GetParams>, QueryRejection>,
) -> Result<Json<PullRequest>, ApiError>
where
  S: ReviewStore,
{
  let Query(params) = params?;
  require_non_empty("pull_request_id", &params.pull_request_id)?;
  let pr =
    assign::get_pull_request(store.as_ref(), &params.pull_request_id).await?;
  Ok(Json(pr))
}

// ─── Merge ────────────────────────────────────────────────────────────────────

/// `POST /pullRequest/merge`. Idempotent.
pub async fn merge<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<PrIdBody>, JsonRejection>,
) -> Result<Json<PrResponse>, ApiError>
where
  S: ReviewStore,
{
  let Json(body) = payload?;
  require_non_empty("pull_request_id", &body.pull_request_id)?;
  let pr =
    assign::merge_pull_request(store.as_ref(), &body.pull_request_id).await?;
  Ok(Json(PrResponse { pr }))
}

// ─── Reassign ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReassignBody {
  pub pull_request_id: String,
  #[serde(alias = "old_user_id")]
  pub old_reviewer_id: String,
}

/// `POST /pullRequest/reassign`, body:
/// `{"pull_request_id":"pr1","old_reviewer_id":"u2"}`
pub async fn reassign<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<ReassignBody>, JsonRejection>,
) -> Result<Json<Reassignment>, ApiError>
where
  S: ReviewStore,
{
  let Json(body) = payload?;
  require_non_empty("pull_request_id", &body.pull_request_id)?;
  require_non_empty("old_reviewer_id", &body.old_reviewer_id)?;

  let mut rng = StdRng::from_os_rng();
  let outcome = assign::reassign_reviewer(
    store.as_ref(),
    &body.pull_request_id,
    &body.old_reviewer_id,
    &mut rng,
  )
  .await?;
  Ok(Json(outcome))
}
