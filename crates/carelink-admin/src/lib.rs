//! Governed administrative operations for CareLink.
//!
//! Everything here is generic over the capability traits in
//! [`carelink_core`]: a [`DocumentStore`](carelink_core::store::DocumentStore),
//! an [`IdentityProvider`](carelink_core::identity::IdentityProvider) and a
//! [`Mailer`](carelink_core::notify::Mailer). Binaries construct the
//! concrete backends once and hand references in.
//!
//! Every operation is safe to re-run: provisioning resets, the approval
//! state machine refuses repeat decisions, the auditor and the migration
//! runner skip whatever is already in shape.

pub mod approval;
pub mod claims;
pub mod linkage;
pub mod migrate;
pub mod provision;
pub mod seed;

pub use approval::{ApprovalWorkflow, Decision};
pub use claims::ClaimIssuer;
pub use linkage::{LinkageAuditor, LinkageDefect, LinkageReport};
pub use migrate::{FieldMigration, MigrationReport, chw_id_backfill};
pub use provision::{Provisioned, SeedAdmin, ensure_admin};
pub use seed::{SeedReport, seed_facilities, seed_training_materials};
