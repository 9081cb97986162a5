//! Account-status mail for CareLink.
//!
//! Builds the three notification messages the approval workflow sends and
//! provides two [`Mailer`](carelink_core::notify::Mailer) implementations:
//! [`RelayMailer`] posts to an HTTP email relay, [`MemoryMailer`] records
//! messages in memory for tests.
//!
//! # Quick start
//!
//! ```no_run
//! use carelink_notify::{MailSettings, approved_message};
//!
//! let settings = MailSettings {
//!   sender:   "admin@lifecare.example.org".into(),
//!   reviewer: "reviewer@lifecare.example.org".into(),
//! };
//! let msg = approved_message(&settings, "chw@example.com", "Amina");
//! println!("{}: {}", msg.subject, msg.text);
//! ```

mod memory;
mod relay;
mod templates;

pub use memory::MemoryMailer;
pub use relay::{AnyMailer, RelayConfig, RelayMailer};
pub use templates::{
  MailSettings, approved_message, pending_review_message, rejected_message,
};
