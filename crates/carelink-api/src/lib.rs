//! JSON REST identity API for CareLink.
//!
//! Exposes an axum [`Router`] backed by any
//! [`DocumentStore`](carelink_core::store::DocumentStore) plus
//! [`IdentityProvider`](carelink_core::identity::IdentityProvider) pair,
//! with account mail going through any
//! [`Mailer`](carelink_core::notify::Mailer). Everything except
//! self-registration sits behind HTTP Basic auth with a single operator
//! credential.

pub mod audit;
pub mod auth;
pub mod error;
pub mod facilities;
pub mod registrations;
pub mod users;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;

use carelink_admin::ApprovalWorkflow;
use carelink_core::{
  identity::IdentityProvider, notify::Mailer, store::DocumentStore,
};
use carelink_notify::MailSettings;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// Verified sender address for outgoing account mail.
  pub mail_sender:        String,
  /// Inbox that receives pending-approval notices.
  pub mail_reviewer:      String,
  /// Mail relay endpoint; when unset, dispatch reports `NotConfigured`.
  pub mail_relay_url:     Option<String>,
  pub mail_relay_api_key: Option<String>,
}

impl ServerConfig {
  pub fn mail_settings(&self) -> MailSettings {
    MailSettings {
      sender:   self.mail_sender.clone(),
      reviewer: self.mail_reviewer.clone(),
    }
  }

  /// Relay settings, present only when both url and key are configured.
  pub fn relay_config(&self) -> Option<carelink_notify::RelayConfig> {
    match (&self.mail_relay_url, &self.mail_relay_api_key) {
      (Some(url), Some(api_key)) => Some(carelink_notify::RelayConfig {
        url:     url.clone(),
        api_key: api_key.clone(),
      }),
      _ => None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S, P, M> {
  pub store:    Arc<S>,
  pub provider: Arc<P>,
  pub mailer:   Arc<M>,
  pub auth:     Arc<AuthConfig>,
  pub mail:     Arc<MailSettings>,
}

impl<S, P, M> AppState<S, P, M>
where
  S: DocumentStore,
  P: IdentityProvider,
  M: Mailer,
{
  /// An [`ApprovalWorkflow`] borrowing this state's backends.
  pub fn workflow(&self) -> ApprovalWorkflow<'_, S, P, M> {
    ApprovalWorkflow::new(
      self.store.as_ref(),
      self.provider.as_ref(),
      self.mailer.as_ref(),
      MailSettings::clone(&self.mail),
    )
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the `/api` router for `state`.
pub fn api_router<S, P, M>(state: AppState<S, P, M>) -> Router
where
  S: DocumentStore + Clone + 'static,
  P: IdentityProvider + Clone + 'static,
  M: Mailer + Clone + 'static,
{
  Router::new()
    // Self-registration (unauthenticated)
    .route("/api/registrations", post(registrations::create::<S, P, M>))
    // Users and review decisions
    .route("/api/users", get(users::list::<S, P, M>))
    .route("/api/users/{id}", get(users::get_one::<S, P, M>))
    .route("/api/users/{id}/approve", post(users::approve_one::<S, P, M>))
    .route("/api/users/{id}/reject", post(users::reject_one::<S, P, M>))
    // Facilities
    .route(
      "/api/facilities",
      get(facilities::list::<S, P, M>).post(facilities::create::<S, P, M>),
    )
    // Linkage audit
    .route("/api/audit/linkage", get(audit::linkage::<S, P, M>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use carelink_core::identity::IdentityProvider;
  use carelink_notify::MemoryMailer;
  use carelink_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  type TestState = AppState<SqliteStore, SqliteStore, MemoryMailer>;

  async fn make_state(password: &str) -> (TestState, MemoryMailer) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let mailer = MemoryMailer::new();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();

    let state = AppState {
      store:    Arc::new(store.clone()),
      provider: Arc::new(store),
      mailer:   Arc::new(mailer.clone()),
      auth:     Arc::new(AuthConfig {
        username:      "operator".to_string(),
        password_hash: hash,
      }),
      mail:     Arc::new(MailSettings {
        sender:   "admin@lifecare.example.org".to_string(),
        reviewer: "reviewer@lifecare.example.org".to_string(),
      }),
    };
    (state, mailer)
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn request(
    state: TestState,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    api_router(state).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn registration(email: &str) -> Value {
    json!({
      "email": email,
      "password": "chw-password",
      "displayName": "Amina",
      "requestedRole": "chw",
    })
  }

  // ── Auth boundary ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn registration_requires_no_auth() {
    let (state, _mailer) = make_state("secret").await;
    let resp = request(
      state,
      "POST",
      "/api/registrations",
      None,
      Some(registration("amina@example.com")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["user"]["status"], "pending");
    assert_eq!(body["user"]["role"], "unassigned");
    assert_eq!(body["notification"]["state"], "sent");
  }

  #[tokio::test]
  async fn admin_routes_reject_missing_credentials() {
    let (state, _mailer) = make_state("secret").await;
    let resp = request(state, "GET", "/api/users", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn admin_routes_reject_wrong_password() {
    let (state, _mailer) = make_state("secret").await;
    let auth = auth_header("operator", "wrong");
    let resp = request(state, "GET", "/api/users", Some(&auth), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Registration ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn duplicate_registration_conflicts() {
    let (state, _mailer) = make_state("secret").await;
    let first = request(
      state.clone(),
      "POST",
      "/api/registrations",
      None,
      Some(registration("amina@example.com")),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = request(
      state,
      "POST",
      "/api/registrations",
      None,
      Some(registration("amina@example.com")),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert!(body["error"].as_str().unwrap().contains("amina@example.com"));
  }

  #[tokio::test]
  async fn lost_reviewer_mail_still_registers() {
    let (state, mailer) = make_state("secret").await;
    mailer.fail_with("relay down");

    let resp = request(
      state,
      "POST",
      "/api/registrations",
      None,
      Some(registration("amina@example.com")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = body_json(resp).await;
    assert_eq!(body["notification"]["state"], "failed");
    assert_eq!(body["user"]["status"], "pending");
  }

  // ── Review decisions ─────────────────────────────────────────────────────────

  async fn register_one(state: &TestState, email: &str) -> String {
    let resp = request(
      state.clone(),
      "POST",
      "/api/registrations",
      None,
      Some(registration(email)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["user"]["id"]
      .as_str()
      .unwrap()
      .to_string()
  }

  #[tokio::test]
  async fn approve_without_body_grants_requested_role() {
    let (state, mailer) = make_state("secret").await;
    let auth = auth_header("operator", "secret");
    let id = register_one(&state, "amina@example.com").await;

    let resp = request(
      state.clone(),
      "POST",
      &format!("/api/users/{id}/approve"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["user"]["status"], "approved");
    assert_eq!(body["user"]["role"], "chw");
    assert_eq!(body["notification"]["state"], "sent");

    // Claims were pushed to the provider alongside the status write.
    let identity = state.provider.get_user(&id).await.unwrap().unwrap();
    assert_eq!(identity.claims, json!({ "role": "chw" }));

    let sent = mailer.sent();
    assert_eq!(sent.last().unwrap().subject, "Account Approved");
  }

  #[tokio::test]
  async fn approve_with_body_overrides_role() {
    let (state, _mailer) = make_state("secret").await;
    let auth = auth_header("operator", "secret");
    let id = register_one(&state, "amina@example.com").await;

    let resp = request(
      state,
      "POST",
      &format!("/api/users/{id}/approve"),
      Some(&auth),
      Some(json!({ "role": "facility" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["role"], "facility");
  }

  #[tokio::test]
  async fn reject_then_approve_conflicts() {
    let (state, _mailer) = make_state("secret").await;
    let auth = auth_header("operator", "secret");
    let id = register_one(&state, "amina@example.com").await;

    let reject = request(
      state.clone(),
      "POST",
      &format!("/api/users/{id}/reject"),
      Some(&auth),
      Some(json!({ "reason": "certificate expired" })),
    )
    .await;
    assert_eq!(reject.status(), StatusCode::OK);
    let body = body_json(reject).await;
    assert_eq!(body["user"]["status"], "rejected");
    assert_eq!(body["user"]["statusReason"], "certificate expired");

    let approve = request(
      state,
      "POST",
      &format!("/api/users/{id}/approve"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(approve.status(), StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn unknown_user_is_404() {
    let (state, _mailer) = make_state("secret").await;
    let auth = auth_header("operator", "secret");

    let resp = request(state, "GET", "/api/users/ghost", Some(&auth), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn users_list_filters_by_status() {
    let (state, _mailer) = make_state("secret").await;
    let auth = auth_header("operator", "secret");
    let a = register_one(&state, "a@example.com").await;
    register_one(&state, "b@example.com").await;

    request(
      state.clone(),
      "POST",
      &format!("/api/users/{a}/approve"),
      Some(&auth),
      None,
    )
    .await;

    let resp = request(
      state,
      "GET",
      "/api/users?status=pending",
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "b@example.com");

    // The envelope keys come out camelCase like the body.
    assert!(users[0]["createdAt"].as_str().is_some());
    assert!(users[0].get("created_at").is_none());
  }

  #[tokio::test]
  async fn users_list_filters_by_role() {
    let (state, _mailer) = make_state("secret").await;
    let auth = auth_header("operator", "secret");
    let a = register_one(&state, "a@example.com").await;
    register_one(&state, "b@example.com").await;

    request(
      state.clone(),
      "POST",
      &format!("/api/users/{a}/approve"),
      Some(&auth),
      None,
    )
    .await;

    let resp = request(state, "GET", "/api/users?role=chw", Some(&auth), None).await;
    let body = body_json(resp).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["email"], "a@example.com");
  }

  // ── Facilities and audit ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn facility_create_list_and_audit() {
    let (state, _mailer) = make_state("secret").await;
    let auth = auth_header("operator", "secret");

    let create = request(
      state.clone(),
      "POST",
      "/api/facilities",
      Some(&auth),
      Some(json!({
        "facilityName": "Harborside Clinic",
        "facilityType": "hospital",
        "location": "12 Harbor Road",
        "phone": "+1000000000",
        "contactPerson": "Dr. Reed",
        "email": "clinic@example.com",
        "services": ["consultation"],
        "isActive": true,
      })),
    )
    .await;
    assert_eq!(create.status(), StatusCode::CREATED);
    let created = body_json(create).await;
    assert!(created["id"].as_str().is_some());
    assert!(created["createdAt"].as_str().is_some());

    let list = request(state.clone(), "GET", "/api/facilities", Some(&auth), None).await;
    assert_eq!(list.status(), StatusCode::OK);
    let listed = body_json(list).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // The new facility has no admin yet, so the audit flags it.
    let audit = request(state, "GET", "/api/audit/linkage", Some(&auth), None).await;
    assert_eq!(audit.status(), StatusCode::OK);
    let report = body_json(audit).await;
    assert_eq!(report["facilities_scanned"], 1);
    assert_eq!(report["defects"][0]["kind"], "unlinked_facility");
    assert!(report["repaired"].as_array().unwrap().is_empty());
  }
}
