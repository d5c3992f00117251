//! [`SqliteStore`] — the SQLite implementation of [`UserStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use gatehouse_core::{
  store::UserStore,
  user::{NewUser, UserProfile, normalize_email},
};

use crate::{
  Error, Result,
  encode::{RawUser, USER_COLUMNS, UserRow, decode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gatehouse user store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and every
/// clone talks to the same background thread. Statements are executed one at
/// a time, so each write is atomic with respect to concurrent requests.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), "opened user store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection. Other clones of this handle fail with
  /// a database error afterwards.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    tracing::info!("closed user store");
    Ok(())
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

  async fn fetch_one(
    &self,
    sql: String,
    params: Vec<String>,
  ) -> Result<Option<UserProfile>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params_from_iter(params.iter()),
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_profile).transpose()
  }
}

fn validate(violations: Vec<String>) -> Result<()> {
  if violations.is_empty() {
    Ok(())
  } else {
    Err(Error::Validation(violations))
  }
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  type Error = Error;

  async fn find_by_identity_or_email<'a>(
    &'a self,
    identity_id: &'a str,
    email: &'a str,
  ) -> Result<Option<UserProfile>> {
    // An identity match outranks an email match on a different row.
    let sql = format!(
      "SELECT {USER_COLUMNS} FROM users
       WHERE identity_id = ?1 OR email = ?2
       ORDER BY identity_id = ?1 DESC
       LIMIT 1"
    );
    self
      .fetch_one(sql, vec![identity_id.to_owned(), normalize_email(email)])
      .await
  }

  async fn create(&self, input: NewUser) -> Result<UserProfile> {
    validate(input.schema_violations())?;

    let profile = input.into_profile(Uuid::new_v4(), Utc::now());
    let row = UserRow::encode(&profile)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO users ({USER_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ),
          rusqlite::params![
            row.user_id,
            row.identity_id,
            row.full_name,
            row.email,
            row.photo,
            row.given_name,
            row.family_name,
            row.last_login,
            row.provider_data,
            row.created_at,
            row.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(profile)
  }

  async fn save(&self, mut profile: UserProfile) -> Result<UserProfile> {
    validate(profile.schema_violations())?;

    profile.email = normalize_email(&profile.email);
    profile.updated_at = Utc::now();
    let row = UserRow::encode(&profile)?;

    // `created_at` belongs to the row, not to the caller's copy.
    let created_at: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "UPDATE users SET
                 identity_id   = ?2,
                 full_name     = ?3,
                 email         = ?4,
                 photo         = ?5,
                 given_name    = ?6,
                 family_name   = ?7,
                 last_login    = ?8,
                 provider_data = ?9,
                 updated_at    = ?10
               WHERE user_id = ?1
               RETURNING created_at",
              rusqlite::params![
                row.user_id,
                row.identity_id,
                row.full_name,
                row.email,
                row.photo,
                row.given_name,
                row.family_name,
                row.last_login,
                row.provider_data,
                row.updated_at,
              ],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    let created_at = created_at.ok_or(Error::UserNotFound(profile.user_id))?;
    profile.created_at = decode_dt(&created_at)?;
    Ok(profile)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1");
    self.fetch_one(sql, vec![encode_uuid(user_id)]).await
  }

  async fn count_users(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
      })
      .await?;
    Ok(count as u64)
  }
}
