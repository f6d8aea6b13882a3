//! JSON REST API for Rota.
//!
//! Exposes an axum [`Router`] backed by any [`rota_core::store::ReviewStore`].
//! Tracing middleware, TLS, and listening are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = rota_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
//! ```

pub mod error;
pub mod pull_requests;
pub mod teams;
pub mod users;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use rota_core::store::ReviewStore;
use serde_json::{Value, json};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ReviewStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Teams
    .route("/team/add", post(teams::create::<S>))
    .route("/team/get", get(teams::get_one::<S>))
    .route("/team/addUsers", post(teams::add_users::<S>))
    .route("/team/deactivateUsers", post(teams::deactivate_users::<S>))
    // Users
    .route("/users/setIsActive", post(users::set_is_active::<S>))
    .route("/users/getReview", get(users::reviews::<S>))
    // Pull requests
    .route("/pullRequest/create", post(pull_requests::create::<S>))
    .route("/pullRequest/get", get(pull_requests::get_one::<S>))
    .route("/pullRequest/merge", post(pull_requests::merge::<S>))
    .route("/pullRequest/reassign", post(pull_requests::reassign::<S>))
    .with_state(store)
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Reject blank identifiers before they reach the engine.
pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} must not be empty")));
  }
  Ok(())
}

#[cfg(test)]
mod tests;
