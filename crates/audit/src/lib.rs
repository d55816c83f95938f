//! `adminkit-audit` — append-only "who did what to whom" trail.
//!
//! Persistence is a collaborator concern; this crate defines the contract
//! plus an in-memory recorder for tests/dev.

pub mod entry;
pub mod recorder;

pub use entry::{AuditEntry, AuditTarget};
pub use recorder::{AuditTrail, InMemoryAuditTrail};
