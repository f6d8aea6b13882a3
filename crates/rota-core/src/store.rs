//! The `ReviewStore` trait, the persistence contract the engine runs on.
//!
//! The trait is implemented by storage backends (e.g. `rota-store-sqlite`).
//! The engine modules ([`crate::assign`], [`crate::deactivate`]) and the HTTP
//! layer depend on this abstraction, not on any concrete backend.
//!
//! Every write method is atomic on its own. Methods that mutate reviewer sets
//! re-check their preconditions inside the same transaction that performs the
//! write, so a concurrent change between the engine's read and its write is
//! rejected rather than overwritten.

use std::future::Future;

use uuid::Uuid;

use crate::{
  deactivate::ReassignmentRecord,
  pull_request::{NewPullRequest, PrStatus, PullRequest},
  team::{Team, TeamMember, TeamRef},
  user::User,
};

/// Abstraction over a Rota storage backend.
///
/// Business outcomes (`DuplicatePr`, `NotAssigned`, ...) travel through
/// `Self::Error` and are recovered by converting it into [`crate::Error`];
/// anything else becomes [`crate::Error::Storage`].
pub trait ReviewStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Directory reads ───────────────────────────────────────────────────

  /// Retrieve a user by ID. Returns `None` if not found.
  fn get_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// The user's primary team: the earliest membership recorded for them.
  /// Returns `None` if the user belongs to no team.
  fn primary_team<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<TeamRef>, Self::Error>> + Send + 'a;

  /// Retrieve a team with its members by name. Returns `None` if not found.
  fn get_team<'a>(
    &'a self,
    team_name: &'a str,
  ) -> impl Future<Output = Result<Option<Team>, Self::Error>> + Send + 'a;

  /// All members of a team regardless of activity, in join order.
  fn team_members(
    &self,
    team_id: Uuid,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Active members of a team whose IDs are not in `exclude`, ordered by
  /// user ID.
  fn active_team_members<'a>(
    &'a self,
    team_id: Uuid,
    exclude: &'a [String],
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  // ── Directory writes ──────────────────────────────────────────────────

  /// Create a team and upsert its members.
  ///
  /// Returns [`crate::Error::TeamExists`] if the name is taken.
  fn create_team(
    &self,
    team_name: String,
    members: Vec<TeamMember>,
  ) -> impl Future<Output = Result<Team, Self::Error>> + Send + '_;

  /// Upsert `members` and add them to an existing team. Members already in
  /// the team keep their original join position.
  ///
  /// Returns [`crate::Error::TeamNotFound`] if the team does not exist.
  fn add_team_members(
    &self,
    team_name: String,
    members: Vec<TeamMember>,
  ) -> impl Future<Output = Result<Team, Self::Error>> + Send + '_;

  /// Set a single user's activity flag.
  ///
  /// Returns [`crate::Error::UserNotFound`] if the user does not exist.
  fn set_user_active<'a>(
    &'a self,
    user_id: &'a str,
    is_active: bool,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  // ── Pull request reads ────────────────────────────────────────────────

  /// Retrieve a pull request by ID. Returns `None` if not found.
  fn get_pr<'a>(
    &'a self,
    pr_id: &'a str,
  ) -> impl Future<Output = Result<Option<PullRequest>, Self::Error>> + Send + 'a;

  /// Every `OPEN` pull request on which any of `user_ids` is a reviewer,
  /// ordered by pull request ID.
  fn open_prs_for_reviewers<'a>(
    &'a self,
    user_ids: &'a [String],
  ) -> impl Future<Output = Result<Vec<PullRequest>, Self::Error>> + Send + 'a;

  /// Every pull request, open or merged, on which `user_id` is a reviewer,
  /// ordered by pull request ID.
  fn prs_reviewed_by<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<PullRequest>, Self::Error>> + Send + 'a;

  // ── Pull request writes ───────────────────────────────────────────────

  /// Persist a new `OPEN` pull request with the given reviewer set.
  ///
  /// Returns [`crate::Error::DuplicatePr`] if the ID is taken; the existing
  /// pull request is left untouched.
  fn create_pr(
    &self,
    input: NewPullRequest,
    reviewers: Vec<String>,
  ) -> impl Future<Output = Result<PullRequest, Self::Error>> + Send + '_;

  /// Move a pull request to `status`.
  ///
  /// Setting `Merged` on a merged pull request is a no-op. Setting `Open` on
  /// a merged pull request returns [`crate::Error::PrMerged`].
  fn set_pr_status<'a>(
    &'a self,
    pr_id: &'a str,
    status: PrStatus,
  ) -> impl Future<Output = Result<PullRequest, Self::Error>> + Send + 'a;

  /// Replace `old_id` with `new_id` in a pull request's reviewer set.
  ///
  /// Fails with [`crate::Error::PrNotFound`], [`crate::Error::PrMerged`], or
  /// [`crate::Error::NotAssigned`] as evaluated inside the write transaction.
  /// Fails with [`crate::Error::NoCandidate`] if `new_id` is by then the
  /// author, already a reviewer, inactive, or unknown.
  fn replace_reviewer<'a>(
    &'a self,
    pr_id: &'a str,
    old_id: &'a str,
    new_id: &'a str,
  ) -> impl Future<Output = Result<PullRequest, Self::Error>> + Send + 'a;

  /// Mark `user_ids` inactive and apply every reassignment record, all in one
  /// transaction. Either every change commits or none does.
  ///
  /// Each record removes `old_reviewer_id` and adds `new_reviewer_id`. A
  /// record whose pull request is no longer open, or whose old reviewer is no
  /// longer assigned, aborts the whole unit. So does a record whose new
  /// reviewer is the author or is not active once `user_ids` are deactivated
  /// ([`crate::Error::NoCandidate`]).
  fn commit_deactivation<'a>(
    &'a self,
    user_ids: &'a [String],
    reassignments: &'a [ReassignmentRecord],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
