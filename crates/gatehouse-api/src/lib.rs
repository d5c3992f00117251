//! JSON HTTP API for Gatehouse.
//!
//! Exposes an axum [`Router`] backed by any [`gatehouse_core::store::UserStore`].
//! CORS, TLS, and request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = gatehouse_api::api_router(Arc::new(store), Environment::Production);
//! ```

pub mod auth;
pub mod error;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use gatehouse_core::store::UserStore;
use serde::{Deserialize, Serialize};

pub use error::ApiError;

// ─── Environment ──────────────────────────────────────────────────────────────

/// Deployment environment; controls whether internal error detail reaches
/// clients.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  Development,
  #[default]
  Production,
}

impl Environment {
  pub fn exposes_error_detail(self) -> bool { self != Environment::Production }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:       Arc<S>,
  pub environment: Environment,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:       Arc::clone(&self.store),
      environment: self.environment,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, environment: Environment) -> Router<()>
where
  S: UserStore + 'static,
{
  Router::new()
    .route("/", get(health))
    .route("/auth/google", post(auth::google::<S>))
    .with_state(AppState { store, environment })
}

/// `GET /`
async fn health() -> &'static str { "Backend running" }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::IntoResponse,
  };
  use gatehouse_core::store::UniqueKey;
  use gatehouse_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  async fn post_json(
    store: Arc<SqliteStore>,
    environment: Environment,
    body: &str,
  ) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri("/auth/google")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = api_router(store, environment).oneshot(req).await.unwrap();
    into_json(resp).await
  }

  async fn into_json(resp: axum::response::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  fn google_body(email: &str) -> String {
    json!({
      "id": "g-1",
      "full_name": "Ada Lovelace",
      "email": email,
      "google_data": {
        "user": { "photo": "p.png", "givenName": "Ada", "familyName": "Lovelace" }
      }
    })
    .to_string()
  }

  // ── GET / ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_check_reports_running() {
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = api_router(make_store().await, Environment::Production)
      .oneshot(req)
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    assert_eq!(&bytes[..], b"Backend running");
  }

  // ── POST /auth/google ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_login_returns_201() {
    let store = make_store().await;
    let (status, body) =
      post_json(store, Environment::Production, &google_body("Ada@Example.com"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "New user created successfully");
    assert_eq!(body["user"]["identity_id"], "g-1");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["given_name"], "Ada");
    assert_eq!(body["user"]["provider_data"]["user"]["photo"], "p.png");
  }

  #[tokio::test]
  async fn repeat_login_returns_200_with_same_user() {
    let store = make_store().await;
    let (_, first) = post_json(
      store.clone(),
      Environment::Production,
      &google_body("ada@example.com"),
    )
    .await;
    let (status, second) = post_json(
      store,
      Environment::Production,
      &google_body("ada@example.com"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message"], "User already exists");
    assert_eq!(second["user"]["user_id"], first["user"]["user_id"]);
  }

  #[tokio::test]
  async fn missing_email_returns_400_without_writing() {
    let store = make_store().await;
    let (status, body) = post_json(
      store.clone(),
      Environment::Production,
      r#"{"full_name":"A","email":""}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(
      body["message"],
      "Invalid user data: id and email are required"
    );
    assert_eq!(store.count_users().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn missing_full_name_returns_validation_errors() {
    let (status, body) = post_json(
      make_store().await,
      Environment::Production,
      r#"{"id":"g-1","email":"ada@example.com"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error");
    assert_eq!(body["errors"], json!(["full_name is required"]));
  }

  #[tokio::test]
  async fn numeric_id_is_stored_as_string() {
    let (status, body) = post_json(
      make_store().await,
      Environment::Production,
      r#"{"id":12345,"full_name":"Ada","email":"ada@example.com"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["identity_id"], "12345");
  }

  #[tokio::test]
  async fn malformed_body_returns_structured_400() {
    let (status, body) =
      post_json(make_store().await, Environment::Production, "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(
      body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body")
    );
  }

  #[tokio::test]
  async fn store_failure_hides_detail_in_production() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let handle = Arc::new(store.clone());
    store.close().await.unwrap();

    let (status, body) = post_json(
      handle,
      Environment::Production,
      &google_body("ada@example.com"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Server error occurred");
    assert!(body.get("error").is_none());
  }

  #[tokio::test]
  async fn store_failure_shows_detail_in_development() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let handle = Arc::new(store.clone());
    store.close().await.unwrap();

    let (status, body) = post_json(
      handle,
      Environment::Development,
      &google_body("ada@example.com"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn concurrent_first_logins_yield_one_conflict() {
    let store = make_store().await;
    let body = |email: &str| {
      json!({ "id": "g-1", "full_name": "Ada Lovelace", "email": email })
        .to_string()
    };
    let (first, second) = (body("a@example.com"), body("b@example.com"));

    // Distinct emails so the loser can only collide on identity_id. Both
    // lookups are queued on the connection thread before either insert.
    let (a, b) = tokio::join!(
      post_json(store.clone(), Environment::Production, &first),
      post_json(store.clone(), Environment::Production, &second),
    );

    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);

    let conflict = if a.0 == StatusCode::CONFLICT { a.1 } else { b.1 };
    assert_eq!(conflict["success"], false);
    assert_eq!(
      conflict["message"],
      "User with this identity_id already exists"
    );
    assert_eq!(conflict["field"], "identity_id");
    assert_eq!(store.count_users().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn conflict_names_the_field() {
    let resp = ApiError::Conflict(UniqueKey::Email).into_response();
    let (status, body) = into_json(resp).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User with this email already exists");
    assert_eq!(body["field"], "email");
  }

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (
        gatehouse_core::Error::InvalidInput("x".into()),
        StatusCode::BAD_REQUEST,
      ),
      (
        gatehouse_core::Error::Validation(vec!["x".into()]),
        StatusCode::BAD_REQUEST,
      ),
      (
        gatehouse_core::Error::DuplicateKey(UniqueKey::IdentityId),
        StatusCode::CONFLICT,
      ),
      (
        gatehouse_core::Error::Store("boom".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];

    for (err, expected) in cases {
      let api = ApiError::from_core(err, Environment::Production);
      assert_eq!(api.status(), expected);
    }
  }
}
