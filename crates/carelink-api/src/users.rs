//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | Optional `status`, `role` filters |
//! | `GET`  | `/users/:id` | Single user profile |
//! | `POST` | `/users/:id/approve` | Optional body `{"role":"..."}`; returns the decision |
//! | `POST` | `/users/:id/reject` | Body `{"reason":"..."}`; returns the decision |
//!
//! Review decisions return 200 even when the follow-up mail is lost; the
//! `notification` field of the response says what happened to it.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use carelink_admin::Decision;
use carelink_core::{
  identity::IdentityProvider,
  notify::Mailer,
  store::{DocumentStore, collections},
  user::{AccountStatus, Role, UserRecord},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If set, restrict to accounts in this status.
  pub status: Option<AccountStatus>,
  /// If set, restrict to accounts holding this role.
  pub role:   Option<Role>,
}

/// `GET /users[?status=...][&role=...]`
pub async fn list<S, P, M>(
  _auth: Authenticated,
  State(state): State<AppState<S, P, M>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<UserRecord>>, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let docs = match &params.status {
    Some(status) => state
      .store
      .query_eq(
        collections::USERS,
        "status",
        &serde_json::json!(status.as_str()),
      )
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?,
    None => state
      .store
      .list(collections::USERS)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?,
  };

  let mut users = docs
    .into_iter()
    .map(UserRecord::from_document)
    .collect::<Result<Vec<_>, _>>()?;

  if let Some(role) = params.role {
    users.retain(|u| u.profile.role == role);
  }

  Ok(Json(users))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/:id`
pub async fn get_one<S, P, M>(
  _auth: Authenticated,
  State(state): State<AppState<S, P, M>>,
  Path(id): Path<String>,
) -> Result<Json<UserRecord>, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let doc = state
    .store
    .get(collections::USERS, &id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(UserRecord::from_document(doc)?))
}

// ─── Approve ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  /// Role to grant, overriding whatever was requested at registration.
  pub role: Option<Role>,
}

/// `POST /users/:id/approve` — body optional.
pub async fn approve_one<S, P, M>(
  _auth: Authenticated,
  State(state): State<AppState<S, P, M>>,
  Path(id): Path<String>,
  body: Option<Json<ApproveBody>>,
) -> Result<Json<Decision>, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let role = body.and_then(|Json(b)| b.role);
  let decision = state.workflow().approve(&id, role).await?;
  Ok(Json(decision))
}

// ─── Reject ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub reason: String,
}

/// `POST /users/:id/reject` — body: `{"reason":"..."}`.
pub async fn reject_one<S, P, M>(
  _auth: Authenticated,
  State(state): State<AppState<S, P, M>>,
  Path(id): Path<String>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Decision>, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let decision = state.workflow().reject(&id, &body.reason).await?;
  Ok(Json(decision))
}
