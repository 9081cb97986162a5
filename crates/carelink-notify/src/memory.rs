//! [`MemoryMailer`] — a test double that records every message.

use std::sync::{Arc, Mutex};

use carelink_core::notify::{DispatchError, Mailer, Message};

/// A [`Mailer`] that appends to an in-memory log instead of sending.
///
/// Clones share the log. `fail_with` switches the mailer into a failing
/// mode so tests can exercise dispatch-failure paths.
#[derive(Clone, Default)]
pub struct MemoryMailer {
  inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
  sent:    Vec<Message>,
  failure: Option<String>,
}

impl MemoryMailer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Everything sent so far, in order.
  pub fn sent(&self) -> Vec<Message> {
    self.inner.lock().expect("mailer lock").sent.clone()
  }

  /// Make every subsequent send fail with `reason`.
  pub fn fail_with(&self, reason: &str) {
    self.inner.lock().expect("mailer lock").failure = Some(reason.to_owned());
  }

  /// Return to successful sending.
  pub fn succeed(&self) {
    self.inner.lock().expect("mailer lock").failure = None;
  }
}

impl Mailer for MemoryMailer {
  async fn send(&self, message: &Message) -> Result<(), DispatchError> {
    let mut inner = self.inner.lock().expect("mailer lock");
    if let Some(reason) = &inner.failure {
      return Err(DispatchError::Transport(reason.clone()));
    }
    inner.sent.push(message.clone());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn message(subject: &str) -> Message {
    Message {
      to:      "x@example.com".into(),
      from:    "y@example.com".into(),
      subject: subject.into(),
      text:    "body".into(),
    }
  }

  #[tokio::test]
  async fn records_sends_in_order() {
    let mailer = MemoryMailer::new();
    mailer.send(&message("first")).await.unwrap();
    mailer.send(&message("second")).await.unwrap();

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, "first");
    assert_eq!(sent[1].subject, "second");
  }

  #[tokio::test]
  async fn failure_mode_switches_on_and_off() {
    let mailer = MemoryMailer::new();
    mailer.fail_with("relay down");

    let err = mailer.send(&message("lost")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport(ref r) if r == "relay down"));
    assert!(mailer.sent().is_empty());

    mailer.succeed();
    mailer.send(&message("delivered")).await.unwrap();
    assert_eq!(mailer.sent().len(), 1);
  }
}
