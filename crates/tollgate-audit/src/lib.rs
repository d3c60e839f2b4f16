//! # tollgate-audit
//!
//! Append-only, SHA-256 hash-chained audit trail of Tollgate lifecycle
//! events.
//!
//! ## Overview
//!
//! Every event the writer receives is wrapped in an `AuditEntry` that links to
//! the previous entry by hash. Altering any entry, even by one byte, breaks
//! the chain and is caught by `verify_chain`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollgate_audit::InMemoryAuditWriter;
//! use tollgate_core::EventRegistry;
//!
//! let audit = InMemoryAuditWriter::new("conv-001");
//! registry.subscribe("*", Arc::new(audit.clone()));
//! // ... drive the conversation ...
//! assert!(audit.verify_integrity());
//! let log = audit.export_log();
//! ```

pub mod chain;
pub mod entry;
pub mod memory;

pub use chain::{hash_entry, verify_chain};
pub use entry::{AuditEntry, AuditLog};
pub use memory::InMemoryAuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────
