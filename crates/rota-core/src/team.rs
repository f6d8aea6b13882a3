//! Teams and membership.
//!
//! Membership only grows. Deactivating a user changes their activity flag but
//! never removes the membership row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// A team with its members in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
  pub team_id:   Uuid,
  pub team_name: String,
  pub members:   Vec<User>,
}

/// Identity of a team without its member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRef {
  pub team_id:   Uuid,
  pub team_name: String,
}

/// A member as supplied to team creation and member addition. Existing users
/// with the same ID are updated in place.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMember {
  pub user_id:   String,
  pub username:  String,
  #[serde(default)]
  pub is_active: bool,
}
