//! Lifecycle event types.
//!
//! Events are plain data: a type string the registry routes on and a JSON
//! body. Producers should only build an `Event` after checking that someone
//! is subscribed to its type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single lifecycle notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Routing key, one of the constants in [`event_types`] or a caller-defined string.
    pub event_type: String,
    /// Event body. Shape depends on `event_type`.
    pub data: serde_json::Value,
    /// Wall-clock time the event was built (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Well-known event type strings emitted by the engine.
pub mod event_types {
    pub const TOOL_CALL_CREATED: &str = "tool_call.created";
    pub const TOOL_CALL_APPROVED: &str = "tool_call.approved";
    pub const TOOL_CALL_REJECTED: &str = "tool_call.rejected";
    pub const TOOL_CALL_EXECUTING: &str = "tool_call.executing";
    pub const TOOL_CALL_COMPLETED: &str = "tool_call.completed";
    pub const TOOL_CALL_FAILED: &str = "tool_call.failed";

    pub const MESSAGE_ADDED: &str = "conversation.message_added";
    pub const TURN_RETIRED: &str = "conversation.turn_retired";

    pub const RUN_SUSPENDED: &str = "run.suspended";
    pub const RUN_RESUMED: &str = "run.resumed";
    pub const RUN_COMPLETED: &str = "run.completed";
    pub const REQUIREMENT_UNRESOLVED: &str = "run.requirement_unresolved";

    /// Streaming text from the runtime collaborator.
    pub const TEXT_CHUNK: &str = "runtime.text_chunk";

    /// Subscribing under this key receives every event.
    pub const WILDCARD: &str = "*";
}
