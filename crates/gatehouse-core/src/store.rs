//! The `UserStore` trait and the error classification every backend reports.
//!
//! The trait is implemented by storage backends (e.g.
//! `gatehouse-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::{NewUser, UserProfile};

// ─── Error classification ────────────────────────────────────────────────────

/// A field with a store-enforced uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueKey {
  IdentityId,
  Email,
}

impl UniqueKey {
  pub fn as_str(self) -> &'static str {
    match self {
      UniqueKey::IdentityId => "identity_id",
      UniqueKey::Email => "email",
    }
  }
}

impl fmt::Display for UniqueKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What kind of failure a store operation hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// A write would have violated a uniqueness constraint.
  DuplicateKey(UniqueKey),
  /// A write was rejected by the schema; one message per violated rule.
  Validation(Vec<String>),
  /// Anything else: connection loss, corrupt rows, I/O.
  Unavailable,
}

/// Implemented by every backend's error type so callers can branch on the
/// failure kind without inspecting backend internals.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Gatehouse user store backend.
///
/// Backends enforce uniqueness of `identity_id` and `email` independently,
/// store emails normalised (see [`normalize_email`](crate::user::normalize_email)),
/// and maintain `created_at` / `updated_at`.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait UserStore: Send + Sync {
  type Error: StoreError;

  /// Return the user whose `identity_id` or (normalised) `email` matches.
  ///
  /// If the keys match two different users, the `identity_id` match wins.
  fn find_by_identity_or_email<'a>(
    &'a self,
    identity_id: &'a str,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + 'a;

  /// Persist a new user. The `user_id` and timestamps are assigned by the
  /// store.
  fn create(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  /// Persist changes to an existing user and return the stored record with a
  /// refreshed `updated_at`.
  fn save(
    &self,
    profile: UserProfile,
  ) -> impl Future<Output = Result<UserProfile, Self::Error>> + Send + '_;

  /// Retrieve a user by primary key. Returns `None` if not found.
  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Number of stored users.
  fn count_users(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
