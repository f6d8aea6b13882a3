//! Directory: user, team, and membership lookups.
//!
//! Thin wrappers over [`ReviewStore`] that turn "not found" into typed errors
//! and add the team-management operations the request layer exposes.

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  pull_request::{PullRequest, PullRequestShort},
  store::ReviewStore,
  team::{Team, TeamMember, TeamRef},
  user::{User, UserWithTeam},
};

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// Fetch a user or fail with [`Error::UserNotFound`].
pub async fn require_user<S: ReviewStore>(
  store: &S,
  user_id: &str,
) -> Result<User> {
  store
    .get_user(user_id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::UserNotFound(user_id.to_owned()))
}

/// Fetch a team by name or fail with [`Error::TeamNotFound`].
pub async fn require_team<S: ReviewStore>(
  store: &S,
  team_name: &str,
) -> Result<Team> {
  store
    .get_team(team_name)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::TeamNotFound(team_name.to_owned()))
}

/// Fetch a pull request or fail with [`Error::PrNotFound`].
pub async fn require_pr<S: ReviewStore>(
  store: &S,
  pr_id: &str,
) -> Result<PullRequest> {
  store
    .get_pr(pr_id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::PrNotFound(pr_id.to_owned()))
}

/// The user's primary team, if they have one.
pub async fn primary_team<S: ReviewStore>(
  store: &S,
  user_id: &str,
) -> Result<Option<TeamRef>> {
  store.primary_team(user_id).await.map_err(Error::from_store)
}

/// Active members of `team_id` minus `exclude`, ordered by user ID.
pub async fn candidate_pool<S: ReviewStore>(
  store: &S,
  team_id: Uuid,
  exclude: &[String],
) -> Result<Vec<User>> {
  store
    .active_team_members(team_id, exclude)
    .await
    .map_err(Error::from_store)
}

// ─── Team management ─────────────────────────────────────────────────────────

/// Create a team with an initial member list.
pub async fn create_team<S: ReviewStore>(
  store: &S,
  team_name: String,
  members: Vec<TeamMember>,
) -> Result<Team> {
  let team = store
    .create_team(team_name, members)
    .await
    .map_err(Error::from_store)?;
  info!(
    team = %team.team_name,
    members = team.members.len(),
    "created team"
  );
  Ok(team)
}

/// Add members to an existing team.
pub async fn add_team_members<S: ReviewStore>(
  store: &S,
  team_name: String,
  members: Vec<TeamMember>,
) -> Result<Team> {
  let added = members.len();
  let team = store
    .add_team_members(team_name, members)
    .await
    .map_err(Error::from_store)?;
  info!(team = %team.team_name, added, "added team members");
  Ok(team)
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Flip a single user's activity flag. No reviewer obligations are moved;
/// use [`crate::deactivate::deactivate_and_reassign`] for that.
pub async fn set_user_active<S: ReviewStore>(
  store: &S,
  user_id: &str,
  is_active: bool,
) -> Result<UserWithTeam> {
  let user = store
    .set_user_active(user_id, is_active)
    .await
    .map_err(Error::from_store)?;
  let team = primary_team(store, user_id).await?;
  info!(user = %user.user_id, is_active, "updated user activity");
  Ok(UserWithTeam {
    user,
    team_name: team.map(|t| t.team_name),
  })
}

/// Pull requests, open or merged, on which `user_id` is currently a reviewer.
pub async fn user_reviews<S: ReviewStore>(
  store: &S,
  user_id: &str,
) -> Result<Vec<PullRequestShort>> {
  let prs = store.prs_reviewed_by(user_id).await.map_err(Error::from_store)?;
  Ok(prs.into_iter().map(PullRequestShort::from).collect())
}
