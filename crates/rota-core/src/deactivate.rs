//! Bulk deactivation coordinator.
//!
//! Turns "deactivate these team members" into a consistent, load-balanced set
//! of reviewer substitutions and commits the deactivation and every
//! substitution as a single unit.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  directory::{candidate_pool, require_team},
  pull_request::PullRequest,
  store::ReviewStore,
  user::User,
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// One reviewer substitution on one pull request. Produced by the planner,
/// applied by [`ReviewStore::commit_deactivation`], and echoed back to the
/// caller; never persisted as an entity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentRecord {
  pub pr_id:           String,
  #[serde(rename = "from_reviewer")]
  pub old_reviewer_id: String,
  #[serde(rename = "to_reviewer")]
  pub new_reviewer_id: String,
}

/// Result of [`deactivate_and_reassign`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeactivationResult {
  pub deactivated_users: Vec<String>,
  pub reassigned_prs:    Vec<ReassignmentRecord>,
  /// One message per requested user that is not a member of the team.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors:            Vec<String>,
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// Split `requested` into team members and non-members, preserving request
/// order and dropping repeats.
pub fn partition_members(
  requested: &[String],
  members: &[User],
) -> (Vec<String>, Vec<String>) {
  let member_ids: HashSet<&str> =
    members.iter().map(|m| m.user_id.as_str()).collect();
  let mut seen = HashSet::new();
  let mut valid = Vec::new();
  let mut invalid = Vec::new();

  for id in requested {
    if !seen.insert(id.as_str()) {
      continue;
    }
    if member_ids.contains(id.as_str()) {
      valid.push(id.clone());
    } else {
      invalid.push(id.clone());
    }
  }
  (valid, invalid)
}

/// The replacement exclusion set: every deactivated user plus the author of
/// every affected pull request, sorted and deduplicated.
pub fn exclusion_set(deactivated: &[String], prs: &[PullRequest]) -> Vec<String> {
  deactivated
    .iter()
    .cloned()
    .chain(prs.iter().map(|pr| pr.author_id.clone()))
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

/// Lay out every deactivated reviewer assignment as one sequence of slots and
/// fill slot *i* with `candidates[i mod n]`.
///
/// Slots are visited by pull request ID, then by reviewer ID within a pull
/// request, so the distribution is reproducible and spreads evenly across
/// all affected pull requests rather than per pull request. An empty
/// candidate list yields no records.
pub fn plan_reassignments(
  prs: &[PullRequest],
  deactivated: &[String],
  candidates: &[User],
) -> Vec<ReassignmentRecord> {
  if candidates.is_empty() {
    return Vec::new();
  }
  let deactivated: HashSet<&str> =
    deactivated.iter().map(String::as_str).collect();

  let mut ordered: Vec<&PullRequest> = prs.iter().collect();
  ordered.sort_by(|a, b| a.pull_request_id.cmp(&b.pull_request_id));

  let mut records = Vec::new();
  for pr in ordered {
    let mut vacated: Vec<&String> = pr
      .assigned_reviewers
      .iter()
      .filter(|r| deactivated.contains(r.as_str()))
      .collect();
    vacated.sort();

    for old in vacated {
      let new = &candidates[records.len() % candidates.len()];
      records.push(ReassignmentRecord {
        pr_id:           pr.pull_request_id.clone(),
        old_reviewer_id: old.clone(),
        new_reviewer_id: new.user_id.clone(),
      });
    }
  }
  records
}

/// Count the vacated reviewer slots across `prs`.
fn vacated_slots(prs: &[PullRequest], deactivated: &[String]) -> usize {
  prs
    .iter()
    .flat_map(|pr| pr.assigned_reviewers.iter())
    .filter(|r| deactivated.contains(r))
    .count()
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

/// Deactivate team members in bulk and re-route their open review
/// obligations.
///
/// Requested users who are not members of the team are reported in
/// [`DeactivationResult::errors`] and do not abort the operation. If no
/// eligible replacement exists, affected pull requests are left
/// reviewer-short. The deactivation and all substitutions commit together or
/// not at all.
pub async fn deactivate_and_reassign<S: ReviewStore>(
  store: &S,
  team_name: &str,
  user_ids: &[String],
) -> Result<DeactivationResult> {
  let team = require_team(store, team_name).await?;
  let members = store
    .team_members(team.team_id)
    .await
    .map_err(Error::from_store)?;

  let (valid, invalid) = partition_members(user_ids, &members);
  let errors: Vec<String> = invalid
    .iter()
    .map(|id| format!("user {id} is not in team {}", team.team_name))
    .collect();

  if valid.is_empty() {
    debug!(team = %team.team_name, "no team members to deactivate");
    return Ok(DeactivationResult { errors, ..Default::default() });
  }

  let prs = store
    .open_prs_for_reviewers(&valid)
    .await
    .map_err(Error::from_store)?;
  let exclude = exclusion_set(&valid, &prs);
  let candidates = candidate_pool(store, team.team_id, &exclude).await?;

  let reassignments = plan_reassignments(&prs, &valid, &candidates);
  let slots = vacated_slots(&prs, &valid);
  if reassignments.len() < slots {
    warn!(
      team = %team.team_name,
      slots,
      filled = reassignments.len(),
      "no replacement candidates; pull requests left reviewer-short"
    );
  }
  for rec in &reassignments {
    let co_reviewer = prs.iter().any(|pr| {
      pr.pull_request_id == rec.pr_id && pr.has_reviewer(&rec.new_reviewer_id)
    });
    if co_reviewer {
      warn!(
        pr = %rec.pr_id,
        reviewer = %rec.new_reviewer_id,
        "replacement is already a reviewer on this pull request"
      );
    }
  }

  store
    .commit_deactivation(&valid, &reassignments)
    .await
    .map_err(Error::from_store)?;
  info!(
    team = %team.team_name,
    deactivated = valid.len(),
    reassigned = reassignments.len(),
    "bulk deactivation committed"
  );

  Ok(DeactivationResult {
    deactivated_users: valid,
    reassigned_prs: reassignments,
    errors,
  })
}
