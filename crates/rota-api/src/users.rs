//! Handlers for `/users/*` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
};
use rota_core::{
  directory, pull_request::PullRequestShort, store::ReviewStore,
  user::UserWithTeam,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, require_non_empty};

// ─── Activity flag ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
  pub user_id:   String,
  pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
  pub user: UserWithTeam,
}

/// `POST /users/setIsActive`, body: `{"user_id":"u1","is_active":false}`
///
/// Flips the flag only; open reviews stay assigned. Use
/// `/team/deactivateUsers` to move them.
pub async fn set_is_active<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<SetActiveBody>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError>
where
  S: ReviewStore,
{
  let Json(body) = payload?;
  require_non_empty("user_id", &body.user_id)?;
  let user =
    directory::set_user_active(store.as_ref(), &body.user_id, body.is_active)
      .await?;
  Ok(Json(UserResponse { user }))
}

// ─── Reviews ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewParams {
  pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
  pub user_id:       String,
  pub pull_requests: Vec<PullRequestShort>,
}

/// `GET /users/getReview?user_id=<id>`
///
/// An unknown user simply has no reviews.
pub async fn reviews<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<ReviewParams>, QueryRejection>,
) -> Result<Json<ReviewsResponse>, ApiError>
where
  S: ReviewStore,
{
  let Query(params) = params?;
  require_non_empty("user_id", &params.user_id)?;
  let pull_requests =
    directory::user_reviews(store.as_ref(), &params.user_id).await?;
  Ok(Json(ReviewsResponse { user_id: params.user_id, pull_requests }))
}
