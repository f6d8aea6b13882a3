//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Statuses are stored as their wire names.

use chrono::{DateTime, Utc};
use rota_core::{
  pull_request::{PrStatus, PullRequest},
  team::Team,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PrStatus ─────────────────────────────────────────────────────────────────

pub fn encode_status(s: PrStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<PrStatus> {
  match s {
    "OPEN" => Ok(PrStatus::Open),
    "MERGED" => Ok(PrStatus::Merged),
    other => Err(Error::UnknownStatus(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
#[derive(Debug)]
pub struct RawUser {
  pub user_id:   String,
  pub username:  String,
  pub is_active: bool,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id:   row.get(0)?,
      username:  row.get(1)?,
      is_active: row.get(2)?,
    })
  }

  pub fn into_user(self) -> User {
    User {
      user_id:   self.user_id,
      username:  self.username,
      is_active: self.is_active,
    }
  }
}

/// Raw strings read from a `teams` row plus its member rows.
#[derive(Debug)]
pub struct RawTeam {
  pub team_id:   String,
  pub team_name: String,
  pub members:   Vec<RawUser>,
}

impl RawTeam {
  pub fn into_team(self) -> Result<Team> {
    Ok(Team {
      team_id:   decode_uuid(&self.team_id)?,
      team_name: self.team_name,
      members:   self.members.into_iter().map(RawUser::into_user).collect(),
    })
  }
}

/// Raw strings read from a `pull_requests` row plus its reviewer rows.
#[derive(Debug)]
pub struct RawPullRequest {
  pub pull_request_id:   String,
  pub pull_request_name: String,
  pub author_id:         String,
  pub status:            String,
  pub created_at:        String,
  pub merged_at:         Option<String>,
  // pr_reviewers rows, ordered by user_id
  pub reviewers:         Vec<String>,
}

impl RawPullRequest {
  pub fn is_merged(&self) -> bool { self.status == PrStatus::Merged.as_str() }

  pub fn into_pull_request(self) -> Result<PullRequest> {
    Ok(PullRequest {
      pull_request_id:    self.pull_request_id,
      pull_request_name:  self.pull_request_name,
      author_id:          self.author_id,
      status:             decode_status(&self.status)?,
      assigned_reviewers: self.reviewers,
      created_at:         decode_dt(&self.created_at)?,
      merged_at:          self.merged_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
