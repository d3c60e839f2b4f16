//! Tool and tool-call identity types.
//!
//! Tollgate never runs tool logic itself. A tool is only a name, a JSON input
//! contract, and a flag saying whether its author wants a human in the loop.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Everything the engine knows about a tool.
///
/// Registered with the gate at startup. `input_schema` may be `Null` when the
/// tool accepts any JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Stable tool identifier, matched by policy patterns (e.g. "orders_cancel").
    pub name: String,
    /// Human-readable description surfaced to the model.
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the tool's input object.
    #[serde(default)]
    pub input_schema: serde_json::Value,
    /// The tool's own approval flag. When true, approval is always required.
    #[serde(default)]
    pub requires_approval: bool,
}

impl ToolSpec {
    /// Construct a spec with no input schema.
    pub fn new(name: impl Into<String>, requires_approval: bool) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::Value::Null,
            requires_approval,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a JSON Schema for the input object.
    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Opaque identifier for one tool invocation.
///
/// Assigned at creation and stable for the invocation's lifetime. Runtimes
/// that already carry their own call ids can supply them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolCallId(pub String);

impl ToolCallId {
    /// Create a new, unique tool-call id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ToolCallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToolCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ToolCallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ToolCallId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle state of a tool call.
///
/// ```text
/// Pending ──approve──▶ Approved ──start──▶ Executing ──complete──▶ Completed
///    │                                        │
///    └──reject──▶ Rejected                    └──fail──▶ Failed
/// ```
///
/// Auto-approved calls are created directly in `Executing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Pending,
    Approved,
    Rejected,
    Executing,
    Completed,
    Failed,
}

impl ToolCallStatus {
    /// True for states that accept no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The approval policy's decision for one tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// The tool is hidden from the model and no call is ever created for it.
    pub excluded: bool,
    /// A human must approve each call before it executes.
    ///
    /// Meaningless when `excluded` is true; always reported as `true` then.
    pub requires_approval: bool,
}

impl Classification {
    pub const EXCLUDED: Self = Self { excluded: true, requires_approval: true };
    pub const GATED: Self = Self { excluded: false, requires_approval: true };
    pub const AUTO_APPROVED: Self = Self { excluded: false, requires_approval: false };
}

/// A tool invocation proposed by the runtime collaborator, before policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedInvocation {
    /// Runtime-supplied call id. When absent the gate assigns a fresh one.
    #[serde(default)]
    pub id: Option<ToolCallId>,
    /// Name of the tool the model wants to run.
    pub tool_name: String,
    /// Argument object.
    pub input: serde_json::Value,
}

impl ProposedInvocation {
    pub fn new(tool_name: impl Into<String>, input: serde_json::Value) -> Self {
        Self { id: None, tool_name: tool_name.into(), input }
    }

    pub fn with_id(mut self, id: impl Into<ToolCallId>) -> Self {
        self.id = Some(id.into());
        self
    }
}
