//! SQL schema for the Gatehouse SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The two UNIQUE column constraints are what the store relies on to resolve
/// concurrent first logins. Their violation messages name the column as
/// `users.<column>`, which [`crate::error`] maps back to a `UniqueKey`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id        TEXT PRIMARY KEY,
    identity_id    TEXT NOT NULL UNIQUE,
    full_name      TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE,  -- lowercased and trimmed
    photo          TEXT,
    given_name     TEXT,
    family_name    TEXT,
    last_login     TEXT NOT NULL,         -- ISO 8601 UTC
    provider_data  TEXT,                  -- JSON document, stored verbatim
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

PRAGMA user_version = 1;
";
