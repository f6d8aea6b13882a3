//! Pull requests and their review state.
//!
//! A pull request moves from [`PrStatus::Open`] to [`PrStatus::Merged`] and
//! never back. Once merged, its reviewer set is frozen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of reviewers assigned to one pull request.
pub const MAX_REVIEWERS: usize = 2;

/// Lifecycle status of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
  Open,
  Merged,
}

impl PrStatus {
  pub fn is_merged(&self) -> bool { matches!(self, Self::Merged) }

  /// Storage encoding for the `status` column. Serde handles the JSON form.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Open => "OPEN",
      Self::Merged => "MERGED",
    }
  }
}

/// A pull request with its current reviewer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
  pub pull_request_id:    String,
  pub pull_request_name:  String,
  pub author_id:          String,
  pub status:             PrStatus,
  /// Sorted by user ID; never contains `author_id`; at most
  /// [`MAX_REVIEWERS`] entries.
  pub assigned_reviewers: Vec<String>,
  /// Server-assigned at creation.
  pub created_at:         DateTime<Utc>,
  /// Set the first time the pull request is merged.
  pub merged_at:          Option<DateTime<Utc>>,
}

impl PullRequest {
  pub fn has_reviewer(&self, user_id: &str) -> bool {
    self.assigned_reviewers.iter().any(|r| r == user_id)
  }
}

/// Short form used when listing the pull requests a user reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestShort {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
  pub status:            PrStatus,
}

impl From<PullRequest> for PullRequestShort {
  fn from(pr: PullRequest) -> Self {
    PullRequestShort {
      pull_request_id:   pr.pull_request_id,
      pull_request_name: pr.pull_request_name,
      author_id:         pr.author_id,
      status:            pr.status,
    }
  }
}

/// Input to [`crate::assign::create_pull_request`]. The ID is caller-supplied
/// and must be globally unique; `status` and `created_at` are set by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPullRequest {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
}
