//! Error types for `rota-core`.
//!
//! Every variant except [`Error::Storage`] is an expected business outcome
//! and is returned to callers as a typed result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("team not found: {0}")]
  TeamNotFound(String),

  #[error("pull request not found: {0}")]
  PrNotFound(String),

  #[error("pull request {0} already exists")]
  DuplicatePr(String),

  #[error("team {0} already exists")]
  TeamExists(String),

  #[error("author {0} belongs to no team")]
  AuthorHasNoTeam(String),

  #[error("pull request {0} is merged; its reviewers are immutable")]
  PrMerged(String),

  #[error("user {user_id} is not a reviewer of pull request {pr_id}")]
  NotAssigned { pr_id: String, user_id: String },

  #[error("no active replacement candidate for pull request {0}")]
  NoCandidate(String),

  #[error("storage failure: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Lift a backend error into the core error type, recovering any business
  /// outcome it carries.
  pub fn from_store<E: Into<Error>>(err: E) -> Self { err.into() }

  /// True for the "referenced entity does not exist" family.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::UserNotFound(_) | Self::TeamNotFound(_) | Self::PrNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
