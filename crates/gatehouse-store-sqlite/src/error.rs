//! Error type for `gatehouse-store-sqlite`.

use gatehouse_core::store::{StoreError, StoreErrorKind, UniqueKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("a user with this {0} already exists")]
  DuplicateKey(UniqueKey),

  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  /// Attempted to save a user whose row no longer exists.
  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match unique_violation(&err) {
      Some(key) => Error::DuplicateKey(key),
      None => Error::Database(err),
    }
  }
}

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Error::DuplicateKey(key) => StoreErrorKind::DuplicateKey(*key),
      Error::Validation(messages) => StoreErrorKind::Validation(messages.clone()),
      _ => StoreErrorKind::Unavailable,
    }
  }
}

/// Which unique column a failed statement collided on, if any.
///
/// SQLite reports the first violated constraint as
/// `UNIQUE constraint failed: <table>.<column>`.
fn unique_violation(err: &tokio_rusqlite::Error) -> Option<UniqueKey> {
  let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
    failure,
    Some(message),
  )) = err
  else {
    return None;
  };

  if failure.extended_code != rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
    return None;
  }

  match message.strip_prefix("UNIQUE constraint failed: ")? {
    "users.identity_id" => Some(UniqueKey::IdentityId),
    "users.email" => Some(UniqueKey::Email),
    _ => None,
  }
}
