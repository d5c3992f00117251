//! Handler for `POST /auth/google`.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | existing user | `200` | `{"success":true,"message":"User already exists","user":{..}}` |
//! | new user | `201` | `{"success":true,"message":"New user created successfully","user":{..}}` |
//! | failure | `400` / `409` / `500` | see [`ApiError`] |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
};
use gatehouse_core::{
  auth::{AuthOutcome, IdentityAssertion, authenticate_with_identity},
  store::UserStore,
  user::UserProfile,
};
use serde::Serialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub success: bool,
  pub message: &'static str,
  pub user:    UserProfile,
}

impl AuthResponse {
  fn from_outcome(outcome: AuthOutcome) -> (StatusCode, Self) {
    let (status, message) = if outcome.is_created() {
      (StatusCode::CREATED, "New user created successfully")
    } else {
      (StatusCode::OK, "User already exists")
    };
    (status, AuthResponse {
      success: true,
      message,
      user: outcome.into_profile(),
    })
  }
}

/// `POST /auth/google` — body: [`IdentityAssertion`].
pub async fn google<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<IdentityAssertion>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError>
where
  S: UserStore + 'static,
{
  let Json(assertion) = body.inspect_err(|e| {
    tracing::warn!(error = %e, "rejected google auth body");
  })?;

  match authenticate_with_identity(state.store.as_ref(), assertion).await {
    Ok(outcome) => {
      let (status, response) = AuthResponse::from_outcome(outcome);
      tracing::info!(
        user_id = %response.user.user_id,
        created = status == StatusCode::CREATED,
        "google auth succeeded"
      );
      Ok((status, Json(response)))
    }
    Err(err @ gatehouse_core::Error::Store(_)) => {
      tracing::error!(error = %err, "google auth failed");
      Err(ApiError::from_core(err, state.environment))
    }
    Err(err) => {
      tracing::warn!(error = %err, "google auth rejected");
      Err(ApiError::from_core(err, state.environment))
    }
  }
}
