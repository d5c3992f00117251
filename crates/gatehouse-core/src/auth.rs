//! Identity upsert — find or create the user behind an identity assertion.
//!
//! The assertion is trusted as-is; no token verification happens here.
//!
//! Merge policy on the existing-user path:
//! - `last_login` always advances.
//! - `photo`, `given_name`, `family_name` are filled only while absent.
//! - `provider_data` is replaced whenever the assertion carries one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;
use tracing::debug;

use crate::{
  Error, Result,
  provider::{GoogleProfile, ProviderData},
  store::{StoreError, StoreErrorKind, UserStore},
  user::{NewUser, UserProfile},
};

// ─── Input / output ──────────────────────────────────────────────────────────

/// A caller-supplied claim of who a user is.
///
/// Accepts the Google sign-in field names `id` and `google_data` as aliases.
/// Sending both a name and its alias is a duplicate-field error. A numeric
/// identity is taken in its decimal string form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityAssertion {
  #[serde(default, alias = "id", deserialize_with = "identity_string")]
  pub identity_id:   Option<String>,
  #[serde(default)]
  pub full_name:     Option<String>,
  #[serde(default)]
  pub email:         Option<String>,
  #[serde(default, alias = "google_data")]
  pub provider_data: Option<ProviderData>,
}

fn identity_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::Null => Ok(None),
    Value::String(s) => Ok(Some(s)),
    Value::Number(n) => Ok(Some(n.to_string())),
    other => Err(D::Error::custom(format!(
      "invalid type for id: expected string or number, got {other}"
    ))),
  }
}

/// Which branch the upsert took, with the stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
  Existing(UserProfile),
  Created(UserProfile),
}

impl AuthOutcome {
  pub fn profile(&self) -> &UserProfile {
    match self {
      AuthOutcome::Existing(p) | AuthOutcome::Created(p) => p,
    }
  }

  pub fn into_profile(self) -> UserProfile {
    match self {
      AuthOutcome::Existing(p) | AuthOutcome::Created(p) => p,
    }
  }

  pub fn is_created(&self) -> bool { matches!(self, AuthOutcome::Created(_)) }
}

// ─── Operation ───────────────────────────────────────────────────────────────

/// Find the user matching `assertion` by identity or email and refresh it, or
/// create one.
///
/// Makes no store calls if `identity_id` or `email` is missing or blank.
/// Otherwise issues one lookup and exactly one write. Failures are not
/// retried: two concurrent first logins for the same identity produce one
/// `Created` and one [`Error::DuplicateKey`].
pub async fn authenticate_with_identity<S: UserStore>(
  store: &S,
  assertion: IdentityAssertion,
) -> Result<AuthOutcome> {
  let (Some(identity_id), Some(email)) = (
    required(assertion.identity_id),
    required(assertion.email),
  ) else {
    return Err(Error::InvalidInput("id and email are required".to_string()));
  };

  let derived = assertion
    .provider_data
    .as_ref()
    .map(ProviderData::google_profile)
    .unwrap_or_default();

  let existing = store
    .find_by_identity_or_email(&identity_id, &email)
    .await
    .map_err(classify)?;

  match existing {
    Some(mut user) => {
      user.last_login = next_login(user.last_login, Utc::now());
      backfill(&mut user, derived);
      if let Some(data) = assertion.provider_data {
        user.provider_data = Some(data);
      }

      let saved = store.save(user).await.map_err(classify)?;
      debug!(user_id = %saved.user_id, "refreshed existing user");
      Ok(AuthOutcome::Existing(saved))
    }
    None => {
      let input = NewUser {
        identity_id,
        full_name: assertion.full_name.unwrap_or_default(),
        email,
        photo: derived.photo,
        given_name: derived.given_name,
        family_name: derived.family_name,
        last_login: Some(Utc::now()),
        provider_data: assertion.provider_data,
      };

      let created = store.create(input).await.map_err(classify)?;
      debug!(user_id = %created.user_id, "created user");
      Ok(AuthOutcome::Created(created))
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn required(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

/// `now`, unless the clock has not moved past `previous`.
fn next_login(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
  if now > previous {
    now
  } else {
    previous + Duration::microseconds(1)
  }
}

fn backfill(user: &mut UserProfile, derived: GoogleProfile) {
  fill_if_absent(&mut user.photo, derived.photo);
  fill_if_absent(&mut user.given_name, derived.given_name);
  fill_if_absent(&mut user.family_name, derived.family_name);
}

fn fill_if_absent(slot: &mut Option<String>, value: Option<String>) {
  if slot.as_deref().is_none_or(str::is_empty)
    && let Some(value) = value.filter(|v| !v.is_empty())
  {
    *slot = Some(value);
  }
}

fn classify<E: StoreError>(err: E) -> Error {
  match err.kind() {
    StoreErrorKind::DuplicateKey(key) => Error::DuplicateKey(key),
    StoreErrorKind::Validation(messages) => Error::Validation(messages),
    StoreErrorKind::Unavailable => Error::Store(Box::new(err)),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
