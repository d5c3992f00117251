//! Error types for `gatehouse-core`.

use thiserror::Error;

use crate::store::UniqueKey;

/// Why an identity upsert failed.
#[derive(Debug, Error)]
pub enum Error {
  /// A required field of the assertion was missing. The store was not
  /// touched.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// The store rejected the record against its schema.
  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("a user with this {0} already exists")]
  DuplicateKey(UniqueKey),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
