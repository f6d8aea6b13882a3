//! Error type for `rota-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A business outcome detected inside a transaction (duplicate ID, reviewer
  /// not assigned, ...).
  #[error(transparent)]
  Core(#[from] rota_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown pull request status: {0:?}")]
  UnknownStatus(String),
}

impl From<Error> for rota_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(e) => e,
      other => rota_core::Error::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
