//! Handler for `POST /api/registrations` — self-service sign-up.
//!
//! The only unauthenticated route: applicants have no credentials yet.
//! Successful registration leaves a `pending` account behind and reports
//! the reviewer-notification outcome inline.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use carelink_core::{
  identity::IdentityProvider, notify::Mailer, store::DocumentStore,
  user::NewRegistration,
};

use crate::{AppState, error::ApiError};

/// `POST /api/registrations` — body: [`NewRegistration`]; returns 201 +
/// the stored user and the notification outcome.
pub async fn create<S, P, M>(
  State(state): State<AppState<S, P, M>>,
  Json(body): Json<NewRegistration>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let decision = state.workflow().register(body).await?;
  Ok((StatusCode::CREATED, Json(decision)))
}
