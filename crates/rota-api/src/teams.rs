//! Handlers for `/team/*` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/team/add` | Body: `{"team_name":"core","members":[...]}`; 201 |
//! | `GET`  | `/team/get` | `?team_name=core`; 404 if not found |
//! | `POST` | `/team/addUsers` | Body: `{"team_name":"core","members":[...]}` |
//! | `POST` | `/team/deactivateUsers` | Body: `{"team_name":"core","user_ids":[...]}` |

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
use rota_core::{
  deactivate::{DeactivationResult, deactivate_and_reassign},
  directory,
  store::ReviewStore,
  team::{Team, TeamMember},
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, require_non_empty};

#[derive(Debug, Serialize)]
pub struct TeamResponse {
  pub team: Team,
}

#[derive(Debug, Deserialize)]
pub struct MembersBody {
  pub team_name: String,
  pub members:   Vec<TeamMember>,
}

impl MembersBody {
  fn validate(&self) -> Result<(), ApiError> {
    require_non_empty("team_name", &self.team_name)?;
    for m in &self.members {
      require_non_empty("user_id", &m.user_id)?;
    }
    Ok(())
  }
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /team/add`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<MembersBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReviewStore,
{
  let Json(body) = payload?;
  body.validate()?;
  let team =
    directory::create_team(store.as_ref(), body.team_name, body.members).await?;
  Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GetParams {
  pub team_name: String,
}

/// `GET /team/get?team_name=<name>`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  params: Result<Query<GetParams>, QueryRejection>,
) -> Result<Json<Team>, ApiError>
where
  S: ReviewStore,
{
  let Query(params) = params?;
  require_non_empty("team_name", &params.team_name)?;
  let team = directory::require_team(store.as_ref(), &params.team_name).await?;
  Ok(Json(team))
}

// ─── Add members ──────────────────────────────────────────────────────────────

/// `POST /team/addUsers`
pub async fn add_users<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<MembersBody>, JsonRejection>,
) -> Result<Json<TeamResponse>, ApiError>
where
  S: ReviewStore,
{
  let Json(body) = payload?;
  body.validate()?;
  let team =
    directory::add_team_members(store.as_ref(), body.team_name, body.members)
      .await?;
  Ok(Json(TeamResponse { team }))
}

// ─── Bulk deactivation ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeactivateBody {
  pub team_name: String,
  pub user_ids:  Vec<String>,
}

/// `POST /team/deactivateUsers`
///
/// Non-members are reported in the result's `errors` list rather than failing
/// the request.
pub async fn deactivate_users<S>(
  State(store): State<Arc<S>>,
  payload: Result<Json<DeactivateBody>, JsonRejection>,
) -> Result<Json<DeactivationResult>, ApiError>
where
  S: ReviewStore,
{
  let Json(body) = payload?;
  require_non_empty("team_name", &body.team_name)?;
  if body.user_ids.is_empty() {
    return Err(ApiError::BadRequest("user_ids must not be empty".into()));
  }
  let result =
    deactivate_and_reassign(store.as_ref(), &body.team_name, &body.user_ids)
      .await?;
  Ok(Json(result))
}
