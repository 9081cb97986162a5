//! The notification surface: message shape, dispatch outcomes and the
//! `Mailer` trait.
//!
//! Dispatch is best-effort. A failed send is reported as a
//! [`DispatchOutcome::Failed`] value inside the primary operation's success
//! result, never as the operation's error, so a lost mail cannot be
//! mistaken for a lost state transition.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An account-status message. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub to:      String,
  pub from:    String,
  pub subject: String,
  pub text:    String,
}

/// A notification send failed. Deliberately distinct from
/// [`crate::Error`]: callers fold it into a [`DispatchOutcome`] instead of
/// propagating it.
#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("transport error: {0}")]
  Transport(String),

  #[error("mail relay returned status {status}")]
  Relay { status: u16 },

  /// This process has no relay configured.
  #[error("no mail relay configured")]
  NotConfigured,
}

/// What happened to a best-effort dispatch, carried inside the primary
/// operation's success value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DispatchOutcome {
  Sent,
  Failed { reason: String },
}

impl DispatchOutcome {
  pub fn is_sent(&self) -> bool {
    matches!(self, Self::Sent)
  }

  /// Fold a send result into an outcome.
  pub fn from_result(result: Result<(), DispatchError>) -> Self {
    match result {
      Ok(()) => Self::Sent,
      Err(err) => Self::Failed { reason: err.to_string() },
    }
  }
}

/// Abstraction over the notification send surface.
///
/// Implementations do not retry or queue; the caller owns retry policy.
pub trait Mailer: Send + Sync {
  fn send<'a>(
    &'a self,
    message: &'a Message,
  ) -> impl Future<Output = Result<(), DispatchError>> + Send + 'a;
}
