//! SQL schema for the Rota SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS teams (
    team_id     TEXT PRIMARY KEY,
    team_name   TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

-- Membership only grows. `seq` records join order; a user's primary team is
-- their lowest-seq membership.
CREATE TABLE IF NOT EXISTS team_members (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id     TEXT NOT NULL REFERENCES teams(team_id),
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    UNIQUE (team_id, user_id)
);

CREATE TABLE IF NOT EXISTS pull_requests (
    pull_request_id   TEXT PRIMARY KEY,
    pull_request_name TEXT NOT NULL,
    author_id         TEXT NOT NULL REFERENCES users(user_id),
    status            TEXT NOT NULL DEFAULT 'OPEN'
                        CHECK (status IN ('OPEN', 'MERGED')),
    created_at        TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    merged_at         TEXT             -- set on first merge
);

-- Reviewer sets. The primary key gives set semantics.
CREATE TABLE IF NOT EXISTS pr_reviewers (
    pull_request_id TEXT NOT NULL REFERENCES pull_requests(pull_request_id),
    user_id         TEXT NOT NULL REFERENCES users(user_id),
    PRIMARY KEY (pull_request_id, user_id)
);

CREATE INDEX IF NOT EXISTS team_members_user_idx ON team_members(user_id);
CREATE INDEX IF NOT EXISTS pr_reviewers_user_idx ON pr_reviewers(user_id);
CREATE INDEX IF NOT EXISTS pull_requests_status_idx ON pull_requests(status);

PRAGMA user_version = 1;
";
