//! Assignment engine: reviewer selection at creation time and single-reviewer
//! reassignment on request.
//!
//! Randomness is injected per call so selection is reproducible under a
//! seeded generator.

use rand::{
  Rng,
  seq::{IndexedRandom, SliceRandom},
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
  Error, Result,
  directory::{candidate_pool, primary_team, require_pr, require_user},
  pull_request::{MAX_REVIEWERS, NewPullRequest, PrStatus, PullRequest},
  store::ReviewStore,
  user::User,
};

// ─── Selection ───────────────────────────────────────────────────────────────

/// Pick up to [`MAX_REVIEWERS`] distinct reviewers from `pool` by a uniform
/// random permutation. An empty pool yields an empty set.
pub fn select_reviewers<R>(pool: Vec<User>, rng: &mut R) -> Vec<String>
where
  R: Rng + ?Sized,
{
  let mut ids: Vec<String> = pool.into_iter().map(|u| u.user_id).collect();
  ids.shuffle(rng);
  ids.truncate(MAX_REVIEWERS);
  ids
}

/// Pick one candidate uniformly at random, or `None` if `pool` is empty.
pub fn pick_replacement<'a, R>(pool: &'a [User], rng: &mut R) -> Option<&'a User>
where
  R: Rng + ?Sized,
{
  pool.choose(rng)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Create a pull request and assign its initial reviewers.
///
/// Reviewers are drawn from the active members of the author's primary team,
/// excluding the author. Fewer than two eligible members is not an error;
/// the pull request is created with whoever is available.
pub async fn create_pull_request<S, R>(
  store: &S,
  input: NewPullRequest,
  rng: &mut R,
) -> Result<PullRequest>
where
  S: ReviewStore,
  R: Rng + Send + ?Sized,
{
  let author = require_user(store, &input.author_id).await?;
  let team = primary_team(store, &author.user_id)
    .await?
    .ok_or_else(|| Error::AuthorHasNoTeam(author.user_id.clone()))?;

  let pool =
    candidate_pool(store, team.team_id, std::slice::from_ref(&author.user_id))
      .await?;
  let pool_size = pool.len();
  let reviewers = select_reviewers(pool, rng);
  debug!(
    pr = %input.pull_request_id,
    team = %team.team_name,
    pool_size,
    ?reviewers,
    "selected reviewers"
  );

  let pr = store
    .create_pr(input, reviewers)
    .await
    .map_err(Error::from_store)?;
  info!(
    pr = %pr.pull_request_id,
    author = %pr.author_id,
    reviewers = ?pr.assigned_reviewers,
    "created pull request"
  );
  Ok(pr)
}

// ─── Reassign ────────────────────────────────────────────────────────────────

/// Outcome of [`reassign_reviewer`].
#[derive(Debug, Clone, Serialize)]
pub struct Reassignment {
  pub pr:          PullRequest,
  pub replaced_by: String,
}

/// Swap exactly one reviewer on an open pull request.
///
/// The replacement is drawn from the active members of the *old reviewer's*
/// primary team, excluding the author and every reviewer currently assigned
/// (including the one being replaced).
pub async fn reassign_reviewer<S, R>(
  store: &S,
  pr_id: &str,
  old_reviewer_id: &str,
  rng: &mut R,
) -> Result<Reassignment>
where
  S: ReviewStore,
  R: Rng + Send + ?Sized,
{
  let pr = require_pr(store, pr_id).await?;
  let old = require_user(store, old_reviewer_id).await?;

  if pr.status.is_merged() {
    return Err(Error::PrMerged(pr.pull_request_id));
  }
  if !pr.has_reviewer(&old.user_id) {
    return Err(Error::NotAssigned {
      pr_id:   pr.pull_request_id,
      user_id: old.user_id,
    });
  }

  let Some(team) = primary_team(store, &old.user_id).await? else {
    return Err(Error::NoCandidate(pr.pull_request_id));
  };

  let mut exclude = Vec::with_capacity(pr.assigned_reviewers.len() + 1);
  exclude.push(pr.author_id.clone());
  exclude.extend(pr.assigned_reviewers.iter().cloned());
  let pool = candidate_pool(store, team.team_id, &exclude).await?;

  let new_id = match pick_replacement(&pool, rng) {
    Some(u) => u.user_id.clone(),
    None => return Err(Error::NoCandidate(pr.pull_request_id)),
  };

  let updated = store
    .replace_reviewer(&pr.pull_request_id, &old.user_id, &new_id)
    .await
    .map_err(Error::from_store)?;
  info!(
    pr = %updated.pull_request_id,
    from = %old.user_id,
    to = %new_id,
    "reassigned reviewer"
  );

  Ok(Reassignment { pr: updated, replaced_by: new_id })
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Mark a pull request merged. Merging an already-merged pull request returns
/// it unchanged.
pub async fn merge_pull_request<S: ReviewStore>(
  store: &S,
  pr_id: &str,
) -> Result<PullRequest> {
  let pr = store
    .set_pr_status(pr_id, PrStatus::Merged)
    .await
    .map_err(Error::from_store)?;
  info!(pr = %pr.pull_request_id, "merged pull request");
  Ok(pr)
}

/// Fetch a pull request by ID.
pub async fn get_pull_request<S: ReviewStore>(
  store: &S,
  pr_id: &str,
) -> Result<PullRequest> {
  require_pr(store, pr_id).await
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  fn users(ids: &[&str]) -> Vec<User> {
    ids
      .iter()
      .map(|id| User {
        user_id:   (*id).to_owned(),
        username:  format!("user {id}"),
        is_active: true,
      })
      .collect()
  }

  #[test]
  fn select_reviewers_caps_at_two_distinct() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
      let picked = select_reviewers(users(&["b", "c", "d", "e"]), &mut rng);
      assert_eq!(picked.len(), MAX_REVIEWERS);
      let distinct: HashSet<_> = picked.iter().collect();
      assert_eq!(distinct.len(), picked.len());
    }
  }

  #[test]
  fn select_reviewers_takes_whole_small_pool() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(select_reviewers(users(&["b"]), &mut rng), vec!["b"]);
    assert!(select_reviewers(Vec::new(), &mut rng).is_empty());
  }

  #[test]
  fn select_reviewers_is_reproducible_with_same_seed() {
    let pool = users(&["b", "c", "d", "e", "f"]);
    let a = select_reviewers(pool.clone(), &mut StdRng::seed_from_u64(42));
    let b = select_reviewers(pool, &mut StdRng::seed_from_u64(42));
    assert_eq!(a, b);
  }

  #[test]
  fn select_reviewers_reaches_every_candidate() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut seen = HashSet::new();
    for _ in 0..200 {
      seen.extend(select_reviewers(users(&["b", "c", "d"]), &mut rng));
    }
    assert_eq!(seen.len(), 3);
  }

  #[test]
  fn pick_replacement_empty_pool_is_none() {
    let mut rng = StdRng::seed_from_u64(0);
    assert!(pick_replacement(&[], &mut rng).is_none());
    let pool = users(&["d"]);
    assert_eq!(pick_replacement(&pool, &mut rng).unwrap().user_id, "d");
  }
}
