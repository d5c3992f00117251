//! User records — the single persisted entity.
//!
//! A user is created on the first successful authentication for an
//! identity/email pair and mutated on every later one. Users are never
//! deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::ProviderData;

// ─── Persisted record ────────────────────────────────────────────────────────

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  /// Store-assigned primary key.
  pub user_id:       Uuid,
  /// The identity provider's subject identifier. Unique.
  pub identity_id:   String,
  pub full_name:     String,
  /// Always lowercase and trimmed. Unique.
  pub email:         String,
  pub photo:         Option<String>,
  pub given_name:    Option<String>,
  pub family_name:   Option<String>,
  pub last_login:    DateTime<Utc>,
  /// Raw provider payload from the most recent login that carried one.
  pub provider_data: Option<ProviderData>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl UserProfile {
  /// Messages for every schema rule this record breaks.
  pub fn schema_violations(&self) -> Vec<String> {
    schema_violations(&self.identity_id, &self.full_name, &self.email)
  }
}

// ─── Insert shape ────────────────────────────────────────────────────────────

/// Input to [`UserStore::create`](crate::store::UserStore::create).
///
/// `user_id`, `created_at` and `updated_at` are assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
  pub identity_id:   String,
  pub full_name:     String,
  pub email:         String,
  pub photo:         Option<String>,
  pub given_name:    Option<String>,
  pub family_name:   Option<String>,
  /// Defaults to the creation timestamp when `None`.
  pub last_login:    Option<DateTime<Utc>>,
  pub provider_data: Option<ProviderData>,
}

impl NewUser {
  pub fn new(
    identity_id: impl Into<String>,
    full_name: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      identity_id: identity_id.into(),
      full_name: full_name.into(),
      email: email.into(),
      ..Default::default()
    }
  }

  pub fn schema_violations(&self) -> Vec<String> {
    schema_violations(&self.identity_id, &self.full_name, &self.email)
  }

  /// Materialise the record a store would persist for this input.
  pub fn into_profile(self, user_id: Uuid, now: DateTime<Utc>) -> UserProfile {
    UserProfile {
      user_id,
      identity_id: self.identity_id,
      full_name: self.full_name,
      email: normalize_email(&self.email),
      photo: self.photo,
      given_name: self.given_name,
      family_name: self.family_name,
      last_login: self.last_login.unwrap_or(now),
      provider_data: self.provider_data,
      created_at: now,
      updated_at: now,
    }
  }
}

// ─── Schema rules ────────────────────────────────────────────────────────────

/// Canonical stored form of an email address.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

/// The schema every backend enforces on create and save. Returns one
/// message per violated rule, in field order.
pub fn schema_violations(
  identity_id: &str,
  full_name: &str,
  email: &str,
) -> Vec<String> {
  [
    ("identity_id", identity_id),
    ("full_name", full_name),
    ("email", email),
  ]
  .into_iter()
  .filter(|(_, value)| value.trim().is_empty())
  .map(|(field, _)| format!("{field} is required"))
  .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_email_trims_and_lowercases() {
    assert_eq!(normalize_email("  User@Example.com "), "user@example.com");
  }

  #[test]
  fn schema_violations_lists_each_blank_field() {
    assert!(schema_violations("g-1", "Alice", "a@b.com").is_empty());
    assert_eq!(schema_violations("g-1", "  ", "a@b.com"), vec![
      "full_name is required".to_string()
    ]);
    assert_eq!(schema_violations("", "", "").len(), 3);
  }

  #[test]
  fn into_profile_defaults_last_login_to_creation_time() {
    let now = Utc::now();
    let profile = NewUser::new("g-1", "Alice", " Alice@Example.COM")
      .into_profile(Uuid::new_v4(), now);

    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.last_login, now);
    assert_eq!(profile.created_at, now);
    assert_eq!(profile.updated_at, now);
  }
}
