//! Users: the people who author and review pull requests.

use serde::{Deserialize, Serialize};

/// A directory user. Users are created through team operations and are only
/// ever mutated by activation changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:   String,
  pub username:  String,
  /// Only active users are eligible as reviewers or replacements.
  pub is_active: bool,
}

/// A user together with the name of their primary team, if any.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithTeam {
  #[serde(flatten)]
  pub user:      User,
  pub team_name: Option<String>,
}
