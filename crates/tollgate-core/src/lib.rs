//! # tollgate-core
//!
//! The approval engine itself.
//!
//! This crate provides:
//! - The seam traits (`ApprovalClassifier`, `InputValidator`, `SnapshotCodec`,
//!   `SnapshotStore`, `RunRuntime`, `EventHandler`)
//! - `ToolCall`, the per-invocation state machine
//! - `Conversation`, which refuses user input while a call awaits a decision
//! - `ToolGate`, which turns proposals into tool calls under policy
//! - `ResumeCoordinator`, which suspends runs and applies batched decisions
//! - `EventRegistry`, the lifecycle event fan-out
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tollgate_core::{Conversation, ToolGate, ResumeCoordinator, EventRegistry};
//! ```

pub mod conversation;
pub mod events;
pub mod gate;
pub mod resume;
pub mod tool_call;
pub mod traits;

pub use conversation::Conversation;
pub use events::EventRegistry;
pub use gate::ToolGate;
pub use resume::ResumeCoordinator;
pub use tool_call::ToolCall;
