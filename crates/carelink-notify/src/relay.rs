//! [`RelayMailer`] — sends mail by POSTing JSON to an HTTP email relay.

use std::time::Duration;

use serde::Deserialize;

use carelink_core::notify::{DispatchError, Mailer, Message};

/// Connection settings for the email relay.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
  /// Full endpoint URL, e.g. `https://relay.example.org/v1/send`.
  pub url:     String,
  /// Bearer token presented on every request.
  pub api_key: String,
}

/// A [`Mailer`] backed by an HTTP relay.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based. One
/// request per message; no retry here, the caller owns retry policy.
#[derive(Clone)]
pub struct RelayMailer {
  client: reqwest::Client,
  config: RelayConfig,
}

impl RelayMailer {
  pub fn new(config: RelayConfig) -> Result<Self, DispatchError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| DispatchError::Transport(e.to_string()))?;
    Ok(Self { client, config })
  }
}

impl Mailer for RelayMailer {
  async fn send(&self, message: &Message) -> Result<(), DispatchError> {
    let resp = self
      .client
      .post(&self.config.url)
      .bearer_auth(&self.config.api_key)
      .json(message)
      .send()
      .await
      .map_err(|e| DispatchError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(DispatchError::Relay { status: resp.status().as_u16() });
    }

    Ok(())
  }
}

// ─── AnyMailer ───────────────────────────────────────────────────────────────

/// A mailer that may be switched off.
///
/// Binaries build this from their configuration: a relay section yields
/// [`AnyMailer::Relay`], its absence yields [`AnyMailer::Disabled`], where
/// every send fails with [`DispatchError::NotConfigured`] and the workflow
/// records the outcome instead of mailing.
#[derive(Clone)]
pub enum AnyMailer {
  Relay(RelayMailer),
  Disabled,
}

impl AnyMailer {
  pub fn from_config(config: Option<RelayConfig>) -> Result<Self, DispatchError> {
    match config {
      Some(config) => Ok(Self::Relay(RelayMailer::new(config)?)),
      None => Ok(Self::Disabled),
    }
  }
}

impl Mailer for AnyMailer {
  async fn send(&self, message: &Message) -> Result<(), DispatchError> {
    match self {
      Self::Relay(mailer) => mailer.send(message).await,
      Self::Disabled => Err(DispatchError::NotConfigured),
    }
  }
}
