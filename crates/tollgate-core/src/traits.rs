//! Trait definitions for the seams around the Tollgate core.
//!
//! - `ApprovalClassifier`: trusted gate deciding whether a tool needs a human
//! - `InputValidator`:     checks a proposed input against the tool's contract
//! - `SnapshotCodec`:      turns an opaque run payload into a storable string
//! - `SnapshotStore`:      holds encoded snapshots between turns
//! - `RunRuntime`:         the language-model runtime that owns the run payload
//! - `EventHandler`:       a lifecycle event subscriber
//!
//! The core never interprets a run payload. Everything it needs from one goes
//! through `RunRuntime`.

use serde_json::Value;

use tollgate_contracts::{
    error::GateResult,
    event::Event,
    run::{PendingRequirement, RunOutcome},
    tool::{Classification, ToolSpec},
    verify::ValidationReport,
};

/// The approval policy seen from the core.
///
/// Implementations must be deterministic and cheap: the gate consults them
/// once per distinct tool name per run and caches the answer.
pub trait ApprovalClassifier: Send + Sync {
    /// Decide whether `tool_name` is hidden, gated, or auto-approved.
    ///
    /// `tool_requires_approval` is the tool's own flag; when true the result
    /// must require approval unless the tool is excluded outright.
    fn classify(&self, tool_name: &str, tool_requires_approval: bool) -> Classification;
}

/// Validates a proposed tool input before a tool call is created for it.
pub trait InputValidator: Send + Sync {
    /// Return a report with `passed = false` and populated failures when the
    /// input does not satisfy `spec`. `Err` is reserved for validator faults.
    fn validate(&self, spec: &ToolSpec, input: &Value) -> GateResult<ValidationReport>;
}

/// Serializes a suspended run payload for a size-constrained session field.
pub trait SnapshotCodec: Send + Sync {
    fn encode(&self, payload: &Value) -> GateResult<String>;

    /// Reverse `encode` exactly. Malformed input fails with
    /// `GateError::CorruptSnapshot` and never yields a partial value.
    fn decode(&self, encoded: &str) -> GateResult<Value>;
}

/// Key/value storage for encoded snapshots, one string per suspended run.
pub trait SnapshotStore: Send + Sync {
    fn put(&self, key: &str, encoded: String) -> GateResult<()>;
    fn get(&self, key: &str) -> GateResult<Option<String>>;
    fn remove(&self, key: &str) -> GateResult<Option<String>>;
}

/// The external language-model runtime that owns in-flight run payloads.
///
/// The marker convention behind `confirm` and `reject` is the runtime's own;
/// the core only needs to be able to apply the two operations and hand the
/// payload back.
pub trait RunRuntime: Send + Sync {
    /// List the requirements the payload is waiting on, in payload order.
    fn pending_requirements(&self, payload: &Value) -> GateResult<Vec<PendingRequirement>>;

    /// Mark one requirement as confirmed inside the payload.
    fn confirm(&self, payload: &mut Value, requirement_id: &str) -> GateResult<()>;

    /// Mark one requirement as rejected inside the payload.
    fn reject(&self, payload: &mut Value, requirement_id: &str, reason: Option<&str>)
        -> GateResult<()>;

    /// Continue the run from a payload whose requirements have been marked.
    fn continue_run(&self, payload: Value) -> GateResult<RunOutcome>;

    /// Requirement ids only, in payload order.
    fn requirement_ids(&self, payload: &Value) -> GateResult<Vec<String>> {
        Ok(self
            .pending_requirements(payload)?
            .into_iter()
            .map(|r| r.requirement_id)
            .collect())
    }
}

/// A subscriber registered with the `EventRegistry`.
///
/// Returning `Err` does not stop other handlers from seeing the event; the
/// registry collects every failure and reports them together.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event) -> GateResult<()>;
}
