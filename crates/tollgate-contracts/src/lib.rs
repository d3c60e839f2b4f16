//! # tollgate-contracts
//!
//! Shared types, schemas, and contracts for the Tollgate tool-approval engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod error;
pub mod event;
pub mod message;
pub mod proposal;
pub mod run;
pub mod tool;
pub mod turn;
pub mod verify;
