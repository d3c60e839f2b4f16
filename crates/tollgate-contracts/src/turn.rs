//! Turn envelope types exchanged with the transport collaborator.
//!
//! A turn arrives as prior messages plus a trailing batch of approve/reject
//! decisions keyed by invocation id. The engine answers with the invocations
//! still awaiting a human and/or a final textual result.

use serde::{Deserialize, Serialize};

use crate::{message::Message, tool::ToolCallId};

/// A human's verdict on one pending invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDecision {
    pub tool_call_id: ToolCallId,
    pub approved: bool,
    /// Optional explanation; only meaningful on rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ToolDecision {
    pub fn approve(id: impl Into<ToolCallId>) -> Self {
        Self { tool_call_id: id.into(), approved: true, reason: None }
    }

    pub fn reject(id: impl Into<ToolCallId>, reason: Option<String>) -> Self {
        Self { tool_call_id: id.into(), approved: false, reason }
    }
}

/// An invocation awaiting a decision, in the shape shown to the human.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingInvocation {
    pub id: ToolCallId,
    pub tool_name: String,
    pub input: serde_json::Value,
}

/// Inbound turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub decisions: Vec<ToolDecision>,
}

/// Outbound turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Invocations that still need a human decision.
    #[serde(default)]
    pub pending: Vec<PendingInvocation>,
    /// Final text, present once the run finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl TurnResponse {
    /// True when the run is parked waiting on at least one decision.
    pub fn is_awaiting_approval(&self) -> bool {
        !self.pending.is_empty()
    }
}
