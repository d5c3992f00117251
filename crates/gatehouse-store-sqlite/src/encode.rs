//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Provider payloads are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use gatehouse_core::{provider::ProviderData, user::UserProfile};
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

// ─── ProviderData ─────────────────────────────────────────────────────────────

pub fn encode_provider_data(data: &ProviderData) -> Result<String> {
  Ok(serde_json::to_string(data)?)
}

pub fn decode_provider_data(s: &str) -> Result<ProviderData> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "user_id, identity_id, full_name, email, photo, \
                                given_name, family_name, last_login, \
                                provider_data, created_at, updated_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub identity_id:   String,
  pub full_name:     String,
  pub email:         String,
  pub photo:         Option<String>,
  pub given_name:    Option<String>,
  pub family_name:   Option<String>,
  pub last_login:    String,
  pub provider_data: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawUser {
  /// Read a row selected with [`USER_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id:       row.get(0)?,
      identity_id:   row.get(1)?,
      full_name:     row.get(2)?,
      email:         row.get(3)?,
      photo:         row.get(4)?,
      given_name:    row.get(5)?,
      family_name:   row.get(6)?,
      last_login:    row.get(7)?,
      provider_data: row.get(8)?,
      created_at:    row.get(9)?,
      updated_at:    row.get(10)?,
    })
  }

  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      user_id:       decode_uuid(&self.user_id)?,
      identity_id:   self.identity_id,
      full_name:     self.full_name,
      email:         self.email,
      photo:         self.photo,
      given_name:    self.given_name,
      family_name:   self.family_name,
      last_login:    decode_dt(&self.last_login)?,
      provider_data: self
        .provider_data
        .as_deref()
        .map(decode_provider_data)
        .transpose()?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Owned column values for an INSERT or UPDATE, in [`USER_COLUMNS`] order.
pub struct UserRow {
  pub user_id:       String,
  pub identity_id:   String,
  pub full_name:     String,
  pub email:         String,
  pub photo:         Option<String>,
  pub given_name:    Option<String>,
  pub family_name:   Option<String>,
  pub last_login:    String,
  pub provider_data: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl UserRow {
  pub fn encode(profile: &UserProfile) -> Result<Self> {
    Ok(UserRow {
      user_id:       encode_uuid(profile.user_id),
      identity_id:   profile.identity_id.clone(),
      full_name:     profile.full_name.clone(),
      email:         profile.email.clone(),
      photo:         profile.photo.clone(),
      given_name:    profile.given_name.clone(),
      family_name:   profile.family_name.clone(),
      last_login:    encode_dt(profile.last_login),
      provider_data: profile
        .provider_data
        .as_ref()
        .map(encode_provider_data)
        .transpose()?,
      created_at:    encode_dt(profile.created_at),
      updated_at:    encode_dt(profile.updated_at),
    })
  }
}
