//! Handlers for `/facilities` endpoints.
//!
//! Listing decodes every stored facility; a facility document that no
//! longer parses is a 500, not a silent omission, so corruption surfaces
//! instead of hiding.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use carelink_core::{
  facility::{Facility, FacilityRecord},
  identity::IdentityProvider,
  notify::Mailer,
  store::{DocumentStore, collections},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /facilities`
pub async fn list<S, P, M>(
  _auth: Authenticated,
  State(state): State<AppState<S, P, M>>,
) -> Result<Json<Vec<FacilityRecord>>, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let records = state
    .store
    .list(collections::FACILITIES)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .map(FacilityRecord::from_document)
    .collect::<Result<Vec<_>, _>>()?;
  Ok(Json(records))
}

/// `POST /facilities` — body: [`Facility`]; returns 201 + the stored record.
pub async fn create<S, P, M>(
  _auth: Authenticated,
  State(state): State<AppState<S, P, M>>,
  Json(body): Json<Facility>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  let doc = state
    .store
    .add(collections::FACILITIES, body.to_value()?)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(FacilityRecord::from_document(doc)?)))
}
