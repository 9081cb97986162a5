//! Handler for `GET /api/audit/linkage`.
//!
//! Read-only over HTTP. Repair rewrites documents, so it stays behind the
//! operator CLI where the report lands in front of whoever asked for it.

use axum::{Json, extract::State};
use carelink_admin::{LinkageAuditor, LinkageReport};
use carelink_core::{
  identity::IdentityProvider, notify::Mailer, store::DocumentStore,
};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /audit/linkage` — the full facility-admin linkage report.
pub async fn linkage<S, P, M>(
  _auth: Authenticated,
  State(state): State<AppState<S, P, M>>,
) -> Result<Json<LinkageReport>, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let report = LinkageAuditor::new(state.store.as_ref()).audit().await?;
  Ok(Json(report))
}
