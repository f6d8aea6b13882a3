//! [`SqliteStore`], the SQLite implementation of [`ReviewStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{
  Connection, OptionalExtension as _, TransactionBehavior, params,
  params_from_iter,
};
use uuid::Uuid;

use rota_core::{
  Error as CoreError,
  deactivate::ReassignmentRecord,
  pull_request::{NewPullRequest, PrStatus, PullRequest},
  store::ReviewStore,
  team::{Team, TeamMember, TeamRef},
  user::User,
};

use crate::{
  Result,
  encode::{
    RawPullRequest, RawTeam, RawUser, decode_uuid, encode_dt, encode_status,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rota review store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised onto one connection thread; every write additionally runs
/// in an `IMMEDIATE` transaction so its precondition checks and its writes
/// see the same state.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

/// `?, ?, ?` with `n` placeholders.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

fn query_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      "SELECT user_id, username, is_active FROM users WHERE user_id = ?1",
      params![user_id],
      RawUser::from_row,
    )
    .optional()
}

/// Members of a team in join order.
fn query_members(conn: &Connection, team_id: &str) -> rusqlite::Result<Vec<RawUser>> {
  let mut stmt = conn.prepare(
    "SELECT u.user_id, u.username, u.is_active
     FROM team_members m
     JOIN users u ON u.user_id = m.user_id
     WHERE m.team_id = ?1
     ORDER BY m.seq",
  )?;
  let rows = stmt
    .query_map(params![team_id], RawUser::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// The user's activity flag, or `None` if the user does not exist.
fn query_is_active(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<bool>> {
  conn
    .query_row(
      "SELECT is_active FROM users WHERE user_id = ?1",
      params![user_id],
      |r| r.get(0),
    )
    .optional()
}

fn query_team_id(conn: &Connection, team_name: &str) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT team_id FROM teams WHERE team_name = ?1",
      params![team_name],
      |r| r.get(0),
    )
    .optional()
}

fn query_team(conn: &Connection, team_name: &str) -> rusqlite::Result<Option<RawTeam>> {
  let Some(team_id) = query_team_id(conn, team_name)? else {
    return Ok(None);
  };
  let members = query_members(conn, &team_id)?;
  Ok(Some(RawTeam { team_id, team_name: team_name.to_owned(), members }))
}

/// Reviewer IDs of a pull request, sorted.
fn query_reviewers(conn: &Connection, pr_id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT user_id FROM pr_reviewers
     WHERE pull_request_id = ?1
     ORDER BY user_id",
  )?;
  let rows = stmt
    .query_map(params![pr_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(rows)
}

fn query_pr(conn: &Connection, pr_id: &str) -> rusqlite::Result<Option<RawPullRequest>> {
  let row = conn
    .query_row(
      "SELECT pull_request_id, pull_request_name, author_id, status,
              created_at, merged_at
       FROM pull_requests WHERE pull_request_id = ?1",
      params![pr_id],
      |row| {
        Ok(RawPullRequest {
          pull_request_id:   row.get(0)?,
          pull_request_name: row.get(1)?,
          author_id:         row.get(2)?,
          status:            row.get(3)?,
          created_at:        row.get(4)?,
          merged_at:         row.get(5)?,
          reviewers:         Vec::new(),
        })
      },
    )
    .optional()?;

  match row {
    Some(mut pr) => {
      pr.reviewers = query_reviewers(conn, pr_id)?;
      Ok(Some(pr))
    }
    None => Ok(None),
  }
}

/// Load a row that the current transaction just wrote.
fn reload_pr(conn: &Connection, pr_id: &str) -> rusqlite::Result<RawPullRequest> {
  query_pr(conn, pr_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Load each pull request named by `sql`, which must select a single
/// `pull_request_id` column.
fn query_prs<P: rusqlite::Params>(
  conn: &Connection,
  sql: &str,
  params: P,
) -> rusqlite::Result<Vec<RawPullRequest>> {
  let ids = {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
      .query_map(params, |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    rows
  };
  ids.iter().map(|id| reload_pr(conn, id)).collect()
}

/// Insert or update each member and add them to the team. Existing
/// memberships keep their join position.
fn upsert_members(
  conn: &Connection,
  team_id: &str,
  members: &[TeamMember],
) -> rusqlite::Result<()> {
  let mut upsert = conn.prepare_cached(
    "INSERT INTO users (user_id, username, is_active) VALUES (?1, ?2, ?3)
     ON CONFLICT(user_id) DO UPDATE
       SET username = excluded.username, is_active = excluded.is_active",
  )?;
  let mut join = conn.prepare_cached(
    "INSERT OR IGNORE INTO team_members (team_id, user_id) VALUES (?1, ?2)",
  )?;
  for m in members {
    upsert.execute(params![m.user_id, m.username, m.is_active])?;
    join.execute(params![team_id, m.user_id])?;
  }
  Ok(())
}

// ─── ReviewStore impl ────────────────────────────────────────────────────────

impl ReviewStore for SqliteStore {
  type Error = crate::Error;

  // ── Directory reads ───────────────────────────────────────────────────────

  async fn get_user<'a>(&'a self, user_id: &'a str) -> Result<Option<User>> {
    let id = user_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(query_user(conn, &id)?))
      .await?;
    Ok(raw.map(RawUser::into_user))
  }

  async fn primary_team<'a>(&'a self, user_id: &'a str) -> Result<Option<TeamRef>> {
    let id = user_id.to_owned();
    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT t.team_id, t.team_name
             FROM team_members m
             JOIN teams t ON t.team_id = m.team_id
             WHERE m.user_id = ?1
             ORDER BY m.seq
             LIMIT 1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(team_id, team_name)| {
        Ok(TeamRef { team_id: decode_uuid(&team_id)?, team_name })
      })
      .transpose()
  }

  async fn get_team<'a>(&'a self, team_name: &'a str) -> Result<Option<Team>> {
    let name = team_name.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(query_team(conn, &name)?))
      .await?;
    raw.map(RawTeam::into_team).transpose()
  }

  async fn team_members(&self, team_id: Uuid) -> Result<Vec<User>> {
    let id = encode_uuid(team_id);
    let raws = self
      .conn
      .call(move |conn| Ok(query_members(conn, &id)?))
      .await?;
    Ok(raws.into_iter().map(RawUser::into_user).collect())
  }

  async fn active_team_members<'a>(
    &'a self,
    team_id: Uuid,
    exclude: &'a [String],
  ) -> Result<Vec<User>> {
    let team_id = encode_uuid(team_id);
    let exclude = exclude.to_vec();

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut sql = String::from(
          "SELECT u.user_id, u.username, u.is_active
           FROM team_members m
           JOIN users u ON u.user_id = m.user_id
           WHERE m.team_id = ? AND u.is_active = 1",
        );
        if !exclude.is_empty() {
          sql.push_str(&format!(
            " AND u.user_id NOT IN ({})",
            placeholders(exclude.len())
          ));
        }
        sql.push_str(" ORDER BY u.user_id");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            params_from_iter(std::iter::once(&team_id).chain(exclude.iter())),
            RawUser::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawUser::into_user).collect())
  }

  // ── Directory writes ──────────────────────────────────────────────────────

  async fn create_team(
    &self,
    team_name: String,
    members: Vec<TeamMember>,
  ) -> Result<Team> {
    let team_id = encode_uuid(Uuid::new_v4());
    let at_str  = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if query_team_id(&tx, &team_name)?.is_some() {
          return Ok(Err(CoreError::TeamExists(team_name)));
        }

        tx.execute(
          "INSERT INTO teams (team_id, team_name, created_at) VALUES (?1, ?2, ?3)",
          params![team_id, team_name, at_str],
        )?;
        upsert_members(&tx, &team_id, &members)?;

        let members = query_members(&tx, &team_id)?;
        tx.commit()?;
        Ok(Ok(RawTeam { team_id, team_name, members }))
      })
      .await??;

    raw.into_team()
  }

  async fn add_team_members(
    &self,
    team_name: String,
    members: Vec<TeamMember>,
  ) -> Result<Team> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(team_id) = query_team_id(&tx, &team_name)? else {
          return Ok(Err(CoreError::TeamNotFound(team_name)));
        };

        upsert_members(&tx, &team_id, &members)?;

        let members = query_members(&tx, &team_id)?;
        tx.commit()?;
        Ok(Ok(RawTeam { team_id, team_name, members }))
      })
      .await??;

    raw.into_team()
  }

  async fn set_user_active<'a>(
    &'a self,
    user_id: &'a str,
    is_active: bool,
  ) -> Result<User> {
    let id = user_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let updated = tx.execute(
          "UPDATE users SET is_active = ?2 WHERE user_id = ?1",
          params![id, is_active],
        )?;
        if updated == 0 {
          return Ok(Err(CoreError::UserNotFound(id)));
        }
        let user = query_user(&tx, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(Ok(user))
      })
      .await??;

    Ok(raw.into_user())
  }

  // ── Pull request reads ────────────────────────────────────────────────────

  async fn get_pr<'a>(&'a self, pr_id: &'a str) -> Result<Option<PullRequest>> {
    let id = pr_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(query_pr(conn, &id)?))
      .await?;
    raw.map(RawPullRequest::into_pull_request).transpose()
  }

  async fn open_prs_for_reviewers<'a>(
    &'a self,
    user_ids: &'a [String],
  ) -> Result<Vec<PullRequest>> {
    if user_ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids = user_ids.to_vec();

    let raws = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT DISTINCT r.pull_request_id
           FROM pr_reviewers r
           JOIN pull_requests p ON p.pull_request_id = r.pull_request_id
           WHERE p.status = 'OPEN' AND r.user_id IN ({})
           ORDER BY r.pull_request_id",
          placeholders(ids.len())
        );
        Ok(query_prs(conn, &sql, params_from_iter(ids.iter()))?)
      })
      .await?;

    raws.into_iter().map(RawPullRequest::into_pull_request).collect()
  }

  async fn prs_reviewed_by<'a>(&'a self, user_id: &'a str) -> Result<Vec<PullRequest>> {
    let id = user_id.to_owned();

    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_prs(
          conn,
          "SELECT pull_request_id FROM pr_reviewers
           WHERE user_id = ?1
           ORDER BY pull_request_id",
          params![id],
        )?)
      })
      .await?;

    raws.into_iter().map(RawPullRequest::into_pull_request).collect()
  }

  // ── Pull request writes ───────────────────────────────────────────────────

  async fn create_pr(
    &self,
    input: NewPullRequest,
    reviewers: Vec<String>,
  ) -> Result<PullRequest> {
    let at_str     = encode_dt(Utc::now());
    let status_str = encode_status(PrStatus::Open);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if query_pr(&tx, &input.pull_request_id)?.is_some() {
          return Ok(Err(CoreError::DuplicatePr(input.pull_request_id)));
        }

        tx.execute(
          "INSERT INTO pull_requests (
             pull_request_id, pull_request_name, author_id, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          params![
            input.pull_request_id,
            input.pull_request_name,
            input.author_id,
            status_str,
            at_str,
          ],
        )?;
        {
          let mut add = tx.prepare_cached(
            "INSERT OR IGNORE INTO pr_reviewers (pull_request_id, user_id)
             VALUES (?1, ?2)",
          )?;
          for reviewer in &reviewers {
            add.execute(params![input.pull_request_id, reviewer])?;
          }
        }

        let pr = reload_pr(&tx, &input.pull_request_id)?;
        tx.commit()?;
        Ok(Ok(pr))
      })
      .await??;

    raw.into_pull_request()
  }

  async fn set_pr_status<'a>(
    &'a self,
    pr_id: &'a str,
    status: PrStatus,
  ) -> Result<PullRequest> {
    let id     = pr_id.to_owned();
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(current) = query_pr(&tx, &id)? else {
          return Ok(Err(CoreError::PrNotFound(id)));
        };

        match status {
          PrStatus::Merged => {
            tx.execute(
              "UPDATE pull_requests
               SET status = 'MERGED', merged_at = COALESCE(merged_at, ?2)
               WHERE pull_request_id = ?1",
              params![id, at_str],
            )?;
          }
          PrStatus::Open if current.is_merged() => {
            return Ok(Err(CoreError::PrMerged(id)));
          }
          PrStatus::Open => {}
        }

        let pr = reload_pr(&tx, &id)?;
        tx.commit()?;
        Ok(Ok(pr))
      })
      .await??;

    raw.into_pull_request()
  }

  async fn replace_reviewer<'a>(
    &'a self,
    pr_id: &'a str,
    old_id: &'a str,
    new_id: &'a str,
  ) -> Result<PullRequest> {
    let pr_id  = pr_id.to_owned();
    let old_id = old_id.to_owned();
    let new_id = new_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(current) = query_pr(&tx, &pr_id)? else {
          return Ok(Err(CoreError::PrNotFound(pr_id)));
        };
        if current.is_merged() {
          return Ok(Err(CoreError::PrMerged(pr_id)));
        }
        if !current.reviewers.contains(&old_id) {
          return Ok(Err(CoreError::NotAssigned { pr_id, user_id: old_id }));
        }
        // The replacement was chosen outside this transaction and may have
        // been taken or deactivated since.
        let eligible = new_id != current.author_id
          && !current.reviewers.contains(&new_id)
          && query_is_active(&tx, &new_id)? == Some(true);
        if !eligible {
          return Ok(Err(CoreError::NoCandidate(pr_id)));
        }

        tx.execute(
          "DELETE FROM pr_reviewers WHERE pull_request_id = ?1 AND user_id = ?2",
          params![pr_id, old_id],
        )?;
        tx.execute(
          "INSERT INTO pr_reviewers (pull_request_id, user_id) VALUES (?1, ?2)",
          params![pr_id, new_id],
        )?;

        let pr = reload_pr(&tx, &pr_id)?;
        tx.commit()?;
        Ok(Ok(pr))
      })
      .await??;

    raw.into_pull_request()
  }

  async fn commit_deactivation<'a>(
    &'a self,
    user_ids: &'a [String],
    reassignments: &'a [ReassignmentRecord],
  ) -> Result<()> {
    let user_ids      = user_ids.to_vec();
    let reassignments = reassignments.to_vec();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !user_ids.is_empty() {
          let sql = format!(
            "UPDATE users SET is_active = 0 WHERE user_id IN ({})",
            placeholders(user_ids.len())
          );
          tx.execute(&sql, params_from_iter(user_ids.iter()))?;
        }

        {
          let mut status = tx.prepare_cached(
            "SELECT status, author_id FROM pull_requests
             WHERE pull_request_id = ?1",
          )?;
          let mut remove = tx.prepare_cached(
            "DELETE FROM pr_reviewers WHERE pull_request_id = ?1 AND user_id = ?2",
          )?;
          let mut add = tx.prepare_cached(
            "INSERT OR IGNORE INTO pr_reviewers (pull_request_id, user_id)
             VALUES (?1, ?2)",
          )?;

          for rec in reassignments {
            let current: Option<(String, String)> = status
              .query_row(params![rec.pr_id], |r| Ok((r.get(0)?, r.get(1)?)))
              .optional()?;
            let author_id = match current {
              None => return Ok(Err(CoreError::PrNotFound(rec.pr_id))),
              Some((s, _)) if s == encode_status(PrStatus::Merged) => {
                return Ok(Err(CoreError::PrMerged(rec.pr_id)));
              }
              Some((_, author_id)) => author_id,
            };
            // Runs after the bulk update, so a replacement that is itself
            // being deactivated is rejected too.
            if rec.new_reviewer_id == author_id
              || query_is_active(&tx, &rec.new_reviewer_id)? != Some(true)
            {
              return Ok(Err(CoreError::NoCandidate(rec.pr_id)));
            }

            if remove.execute(params![rec.pr_id, rec.old_reviewer_id])? == 0 {
              return Ok(Err(CoreError::NotAssigned {
                pr_id:   rec.pr_id,
                user_id: rec.old_reviewer_id,
              }));
            }
            add.execute(params![rec.pr_id, rec.new_reviewer_id])?;
          }
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(())
  }
}
