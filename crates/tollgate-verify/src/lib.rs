//! # tollgate-verify
//!
//! Input validation for proposed tool invocations.
//!
//! This crate provides [`engine::SchemaVerifier`], which implements the
//! [`tollgate_core::traits::InputValidator`] trait. Inputs are checked
//! structurally against the tool's JSON Schema, then by any custom checks the
//! host registered for that tool.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tollgate_verify::engine::SchemaVerifier;
//!
//! let mut verifier = SchemaVerifier::new();
//! verifier.register_check("db_drop", "not-production", Box::new(|input: &serde_json::Value| {
//!     (input["database"] == "production").then(|| "production is off limits".to_string())
//! }));
//! ```

pub mod engine;

pub use engine::{CustomCheckFn, SchemaVerifier, SCHEMA_CHECK_ID};
