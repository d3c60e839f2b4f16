//! # tollgate-ref-ops
//!
//! Operations-desk reference runtime for the Tollgate approval engine.
//!
//! Demonstrates three approval flows using a mock server fleet:
//!
//! 1. **Policy Walkthrough**: how the desk policy classifies each tool, and
//!    which proposals the gate refuses before they reach a human.
//! 2. **Batch Decision**: one turn proposes several gated operations; the
//!    operator approves some and rejects one, and a single resume settles all.
//! 3. **Pause Again**: a multi-batch plan that suspends once per batch, with
//!    an incomplete decision set left unresolved in between.
//!
//! All hosts and outputs are hardcoded and fictional. Nothing is contacted.

pub mod desk;
pub mod mock_data;
pub mod runtime;
pub mod scenarios;

pub use desk::{OpsDesk, TurnReport};
pub use runtime::{ScriptStep, ScriptedRuntime};
