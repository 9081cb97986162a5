//! Message templates for account-status mail.
//!
//! Subjects and body wording are fixed; callers supply only the recipient
//! and the interpolated fields. Client apps key off the subject lines, so
//! changing them is a breaking change.

use serde::Deserialize;

use carelink_core::notify::Message;

/// Addresses the templates need: the verified sender and the reviewer
/// inbox that receives pending-approval notices.
#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
  pub sender:   String,
  pub reviewer: String,
}

/// Mail to the reviewer: a new registration awaits review.
pub fn pending_review_message(
  settings: &MailSettings,
  name: &str,
  email: &str,
) -> Message {
  Message {
    to:      settings.reviewer.clone(),
    from:    settings.sender.clone(),
    subject: "Admin Approval Required".to_owned(),
    text:    format!(
      "Hello, the account for {name} <{email}> requires admin approval."
    ),
  }
}

/// Mail to the applicant: the account was approved.
pub fn approved_message(settings: &MailSettings, to: &str, name: &str) -> Message {
  Message {
    to:      to.to_owned(),
    from:    settings.sender.clone(),
    subject: "Account Approved".to_owned(),
    text:    format!(
      "Hello {name}, your account has been approved and is now active. \
       You can now login and start using the platform."
    ),
  }
}

/// Mail to the applicant: the account was rejected, with the reviewer's
/// reason.
pub fn rejected_message(
  settings: &MailSettings,
  to: &str,
  name: &str,
  reason: &str,
) -> Message {
  Message {
    to:      to.to_owned(),
    from:    settings.sender.clone(),
    subject: "Account Rejected".to_owned(),
    text:    format!(
      "Hello {name}, your account was rejected for the following reason: {reason}"
    ),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn settings() -> MailSettings {
    MailSettings {
      sender:   "admin@lifecare.example.org".into(),
      reviewer: "reviewer@lifecare.example.org".into(),
    }
  }

  #[test]
  fn pending_review_goes_to_reviewer() {
    let msg = pending_review_message(&settings(), "Amina", "amina@example.com");
    assert_eq!(msg.to, "reviewer@lifecare.example.org");
    assert_eq!(msg.from, "admin@lifecare.example.org");
    assert_eq!(msg.subject, "Admin Approval Required");
    assert!(msg.text.contains("Amina <amina@example.com>"));
  }

  #[test]
  fn approved_goes_to_applicant() {
    let msg = approved_message(&settings(), "amina@example.com", "Amina");
    assert_eq!(msg.to, "amina@example.com");
    assert_eq!(msg.subject, "Account Approved");
    assert!(msg.text.starts_with("Hello Amina, your account has been approved"));
  }

  #[test]
  fn rejected_includes_reason() {
    let msg = rejected_message(
      &settings(),
      "amina@example.com",
      "Amina",
      "certificate expired",
    );
    assert_eq!(msg.subject, "Account Rejected");
    assert!(msg.text.ends_with("for the following reason: certificate expired"));
  }
}
