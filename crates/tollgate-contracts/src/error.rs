//! Error types for the Tollgate engine.
//!
//! All fallible operations return `GateResult<T>`. Every variant is a local,
//! typed failure surfaced at the point of detection; none are swallowed.
//! Rejecting a tool call is not an error.

use thiserror::Error;

use crate::tool::{ToolCallId, ToolCallStatus};

/// The unified error type for Tollgate.
#[derive(Debug, Error)]
pub enum GateError {
    /// A state change was attempted that is not legal from the call's current state.
    #[error("tool call '{tool_call_id}' cannot {action} from state '{from}'")]
    InvalidTransition {
        tool_call_id: ToolCallId,
        from: ToolCallStatus,
        action: &'static str,
    },

    /// A decision referenced a tool call the conversation does not hold.
    #[error("tool call '{tool_call_id}' not found")]
    ToolCallNotFound { tool_call_id: ToolCallId },

    /// A tool call with the same id is already part of the current turn.
    #[error("tool call '{tool_call_id}' already exists in the current turn")]
    DuplicateToolCall { tool_call_id: ToolCallId },

    /// A user message was refused because invocations are awaiting a decision.
    #[error("conversation is blocked: {pending} tool call(s) awaiting approval")]
    ConversationBlocked { pending: usize },

    /// The turn cannot be retired while a call is still live.
    #[error("turn cannot be retired: {unresolved} tool call(s) not in a terminal state")]
    TurnNotResolved { unresolved: usize },

    /// A stored snapshot could not be decoded. The run it held is lost.
    #[error("corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    /// An encoded snapshot does not fit the store's size limit.
    #[error("snapshot of {size} bytes exceeds limit of {limit} bytes")]
    SnapshotTooLarge { size: usize, limit: usize },

    /// One or more event handlers failed. Every handler still ran.
    #[error("{} handler(s) failed for event '{event_type}': {}", .failures.len(), .failures.join("; "))]
    HandlerFailed {
        event_type: String,
        failures: Vec<String>,
    },

    /// The runtime collaborator could not read, mark, or continue a run.
    #[error("runtime error: {reason}")]
    RuntimeFailed { reason: String },

    /// The audit trail could not record an event.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the Tollgate crates.
pub type GateResult<T> = Result<T, GateError>;
