//! The tool-call state machine.
//!
//! A `ToolCall` tracks one invocation from proposal to its terminal state.
//! Every transition checks the current state first and leaves the call
//! untouched when it is illegal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tollgate_contracts::{
    error::{GateError, GateResult},
    tool::{ToolCallId, ToolCallStatus},
    turn::PendingInvocation,
};

/// One invocation of one named tool.
///
/// `result`, `error` and `rejection_reason` are mutually exclusive: each is
/// written exactly once, by the transition into `Completed`, `Failed` or
/// `Rejected` respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    id: ToolCallId,
    name: String,
    input: Value,
    status: ToolCallStatus,
    requires_approval: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
    /// Set once `start_execution` has run; lets an auto-approved call accept
    /// exactly one `start_execution` even though it was born `Executing`.
    #[serde(default)]
    started: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ToolCall {
    /// Create a call with a fresh id.
    ///
    /// Calls that require approval start `Pending`; the rest start `Executing`.
    pub fn new(name: impl Into<String>, input: Value, requires_approval: bool) -> Self {
        Self::with_id(ToolCallId::new(), name, input, requires_approval)
    }

    /// Create a call with a runtime-supplied id.
    pub fn with_id(
        id: ToolCallId,
        name: impl Into<String>,
        input: Value,
        requires_approval: bool,
    ) -> Self {
        let now = Utc::now();
        let status = if requires_approval {
            ToolCallStatus::Pending
        } else {
            ToolCallStatus::Executing
        };
        Self {
            id,
            name: name.into(),
            input,
            status,
            requires_approval,
            result: None,
            error: None,
            rejection_reason: None,
            started: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &ToolCallId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn status(&self) -> ToolCallStatus {
        self.status
    }

    pub fn requires_approval(&self) -> bool {
        self.requires_approval
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == ToolCallStatus::Pending
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `Pending` → `Approved`.
    pub fn approve(&mut self) -> GateResult<()> {
        self.ensure_status(ToolCallStatus::Pending, "approve")?;
        self.move_to(ToolCallStatus::Approved);
        Ok(())
    }

    /// `Pending` → `Rejected`, recording the optional human reason.
    pub fn reject(&mut self, reason: Option<String>) -> GateResult<()> {
        self.ensure_status(ToolCallStatus::Pending, "reject")?;
        self.rejection_reason = reason;
        self.move_to(ToolCallStatus::Rejected);
        Ok(())
    }

    /// `Approved` → `Executing`.
    ///
    /// An auto-approved call is created `Executing`; it accepts one
    /// `start_execution` as a no-op so callers can treat both paths alike.
    pub fn start_execution(&mut self) -> GateResult<()> {
        match self.status {
            ToolCallStatus::Approved => {}
            ToolCallStatus::Executing if !self.requires_approval && !self.started => {}
            from => return Err(self.invalid(from, "start execution")),
        }
        self.started = true;
        self.move_to(ToolCallStatus::Executing);
        Ok(())
    }

    /// `Executing` → `Completed`, recording the tool output.
    pub fn complete(&mut self, result: impl Into<String>) -> GateResult<()> {
        self.ensure_status(ToolCallStatus::Executing, "complete")?;
        self.result = Some(result.into());
        self.move_to(ToolCallStatus::Completed);
        Ok(())
    }

    /// `Executing` → `Failed`, recording the error description.
    pub fn fail(&mut self, error: impl Into<String>) -> GateResult<()> {
        self.ensure_status(ToolCallStatus::Executing, "fail")?;
        self.error = Some(error.into());
        self.move_to(ToolCallStatus::Failed);
        Ok(())
    }

    /// The view shown to a human reviewer.
    pub fn to_pending_invocation(&self) -> PendingInvocation {
        PendingInvocation {
            id: self.id.clone(),
            tool_name: self.name.clone(),
            input: self.input.clone(),
        }
    }

    fn ensure_status(&self, required: ToolCallStatus, action: &'static str) -> GateResult<()> {
        if self.status == required {
            Ok(())
        } else {
            Err(self.invalid(self.status, action))
        }
    }

    fn invalid(&self, from: ToolCallStatus, action: &'static str) -> GateError {
        GateError::InvalidTransition {
            tool_call_id: self.id.clone(),
            from,
            action,
        }
    }

    fn move_to(&mut self, status: ToolCallStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use tollgate_contracts::{error::GateError, tool::ToolCallStatus};

    use super::ToolCall;

    fn gated() -> ToolCall {
        ToolCall::new("orders_cancel", json!({ "order_id": 42 }), true)
    }

    fn auto() -> ToolCall {
        ToolCall::new("items_list", json!({}), false)
    }

    #[test]
    fn gated_call_starts_pending() {
        let call = gated();
        assert_eq!(call.status(), ToolCallStatus::Pending);
        assert!(call.requires_approval());
        assert!(call.result().is_none());
        assert!(call.error().is_none());
        assert!(call.rejection_reason().is_none());
    }

    #[test]
    fn auto_approved_call_starts_executing() {
        let call = auto();
        assert_eq!(call.status(), ToolCallStatus::Executing);
        assert!(!call.requires_approval());
    }

    #[test]
    fn happy_path_to_completed() {
        let mut call = gated();
        call.approve().unwrap();
        assert_eq!(call.status(), ToolCallStatus::Approved);
        call.start_execution().unwrap();
        assert_eq!(call.status(), ToolCallStatus::Executing);
        call.complete("order 42 cancelled").unwrap();

        assert_eq!(call.status(), ToolCallStatus::Completed);
        assert_eq!(call.result(), Some("order 42 cancelled"));
        assert!(call.error().is_none());
        assert!(call.rejection_reason().is_none());
    }

    #[test]
    fn failure_records_error_only() {
        let mut call = gated();
        call.approve().unwrap();
        call.start_execution().unwrap();
        call.fail("upstream timeout").unwrap();

        assert_eq!(call.status(), ToolCallStatus::Failed);
        assert_eq!(call.error(), Some("upstream timeout"));
        assert!(call.result().is_none());
    }

    #[test]
    fn reject_records_reason() {
        let mut call = gated();
        call.reject(Some("not during business hours".to_string())).unwrap();
        assert_eq!(call.status(), ToolCallStatus::Rejected);
        assert_eq!(call.rejection_reason(), Some("not during business hours"));
        assert!(call.is_terminal());
    }

    /// approve() then reject() on the same call is an invalid transition.
    #[test]
    fn approve_then_reject_fails() {
        let mut call = gated();
        call.approve().unwrap();

        match call.reject(Some("changed my mind".to_string())) {
            Err(GateError::InvalidTransition { from, action, .. }) => {
                assert_eq!(from, ToolCallStatus::Approved);
                assert_eq!(action, "reject");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        // The failed attempt must not leave a reason behind.
        assert!(call.rejection_reason().is_none());
        assert_eq!(call.status(), ToolCallStatus::Approved);
    }

    /// complete() before start_execution() is an invalid transition.
    #[test]
    fn complete_before_start_fails() {
        let mut call = gated();
        call.approve().unwrap();

        match call.complete("too early") {
            Err(GateError::InvalidTransition { from, .. }) => {
                assert_eq!(from, ToolCallStatus::Approved);
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        assert!(call.result().is_none());
    }

    #[test]
    fn start_from_pending_fails() {
        let mut call = gated();
        assert!(matches!(
            call.start_execution(),
            Err(GateError::InvalidTransition { from: ToolCallStatus::Pending, .. })
        ));
    }

    #[test]
    fn auto_approved_accepts_one_start() {
        let mut call = auto();
        call.start_execution().unwrap();
        assert_eq!(call.status(), ToolCallStatus::Executing);
        assert!(call.start_execution().is_err());
        call.complete("3 items").unwrap();
        assert_eq!(call.result(), Some("3 items"));
    }

    #[test]
    fn auto_approved_cannot_be_approved_or_rejected() {
        let mut call = auto();
        assert!(call.approve().is_err());
        assert!(call.reject(None).is_err());
    }

    #[test]
    fn terminal_states_refuse_everything() {
        let mut rejected = gated();
        rejected.reject(None).unwrap();

        let mut completed = gated();
        completed.approve().unwrap();
        completed.start_execution().unwrap();
        completed.complete("ok").unwrap();

        let mut failed = auto();
        failed.fail("boom").unwrap();

        for call in [&mut rejected, &mut completed, &mut failed] {
            assert!(call.approve().is_err());
            assert!(call.reject(None).is_err());
            assert!(call.start_execution().is_err());
            assert!(call.complete("again").is_err());
            assert!(call.fail("again").is_err());
        }

        // Terminal payloads are untouched by the refused attempts.
        assert_eq!(completed.result(), Some("ok"));
        assert_eq!(failed.error(), Some("boom"));
        assert!(rejected.result().is_none());
    }

    #[test]
    fn serde_round_trip_preserves_state() {
        let mut call = gated();
        call.reject(Some("no".to_string())).unwrap();
        let json = serde_json::to_string(&call).unwrap();
        let decoded: ToolCall = serde_json::from_str(&json).unwrap();
        assert_eq!(call, decoded);
    }

    #[test]
    fn pending_invocation_view() {
        let call = gated();
        let view = call.to_pending_invocation();
        assert_eq!(&view.id, call.id());
        assert_eq!(view.tool_name, "orders_cancel");
        assert_eq!(view.input["order_id"], 42);
    }
}
