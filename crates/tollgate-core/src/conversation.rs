//! The conversation aggregate.
//!
//! A `Conversation` owns the message history and the current turn's tool
//! calls. It enforces one invariant: no new user message while any call is
//! still `Pending`. Every successful tool-call transition is published to the
//! attached `EventRegistry`, if any.
//!
//! Conversations are not internally synchronized. Callers that share one
//! across threads must serialize mutation themselves (one lock per
//! conversation id).

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use tollgate_contracts::{
    error::{GateError, GateResult},
    event::event_types,
    message::{Message, Role},
    run::{InvocationOutput, InvocationResult},
    tool::{ToolCallId, ToolCallStatus},
    turn::{PendingInvocation, ToolDecision},
};

use crate::{events::EventRegistry, tool_call::ToolCall};

/// Aggregate root for one logical exchange.
#[derive(Debug)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
    /// Current turn, in insertion order.
    tool_calls: Vec<ToolCall>,
    /// Calls from retired turns, oldest first.
    archived_tool_calls: Vec<ToolCall>,
    events: Option<Arc<EventRegistry>>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            tool_calls: Vec::new(),
            archived_tool_calls: Vec::new(),
            events: None,
        }
    }

    /// Publish lifecycle events to `registry`.
    pub fn with_events(mut self, registry: Arc<EventRegistry>) -> Self {
        self.events = Some(registry);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The current turn's calls, in the order they were added.
    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn archived_tool_calls(&self) -> &[ToolCall] {
        &self.archived_tool_calls
    }

    pub fn tool_call(&self, id: &ToolCallId) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|c| c.id() == id)
    }

    /// True while any call in the current turn awaits a decision.
    pub fn is_blocked(&self) -> bool {
        self.tool_calls.iter().any(ToolCall::is_pending)
    }

    /// True when every call in the current turn is terminal (or there are none).
    pub fn is_turn_resolved(&self) -> bool {
        self.tool_calls.iter().all(ToolCall::is_terminal)
    }

    pub fn pending_tool_calls(&self) -> Vec<&ToolCall> {
        self.tool_calls.iter().filter(|c| c.is_pending()).collect()
    }

    /// Calls that were allowed to run: executing, completed, or failed.
    pub fn executed_tool_calls(&self) -> Vec<&ToolCall> {
        self.tool_calls
            .iter()
            .filter(|c| {
                matches!(
                    c.status(),
                    ToolCallStatus::Executing | ToolCallStatus::Completed | ToolCallStatus::Failed
                )
            })
            .collect()
    }

    /// Pending calls in the shape shown to a human reviewer.
    pub fn pending_invocations(&self) -> Vec<PendingInvocation> {
        self.pending_tool_calls()
            .into_iter()
            .map(ToolCall::to_pending_invocation)
            .collect()
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    /// Append a top-level user message.
    ///
    /// Fails with `ConversationBlocked` while any call is pending; nothing is
    /// appended then. A `HandlerFailed` error means the message *was*
    /// appended and only an observer failed: do not retry the append.
    pub fn add_user_message(&mut self, content: impl Into<String>) -> GateResult<()> {
        let pending = self.pending_tool_calls().len();
        if pending > 0 {
            debug!(conversation_id = %self.id, pending, "user message refused while blocked");
            return Err(GateError::ConversationBlocked { pending });
        }
        self.push_message(Role::User, content.into())
    }

    /// Assistant output is part of resolving a turn and is never blocked.
    pub fn add_assistant_message(&mut self, content: impl Into<String>) -> GateResult<()> {
        self.push_message(Role::Assistant, content.into())
    }

    /// Tool output is part of resolving a turn and is never blocked.
    pub fn add_tool_message(&mut self, content: impl Into<String>) -> GateResult<()> {
        self.push_message(Role::Tool, content.into())
    }

    pub fn add_system_message(&mut self, content: impl Into<String>) -> GateResult<()> {
        self.push_message(Role::System, content.into())
    }

    /// The message is appended before observers run; a handler failure is
    /// reported but does not undo the append.
    fn push_message(&mut self, role: Role, content: String) -> GateResult<()> {
        self.messages.push(Message::new(role, content));
        let index = self.messages.len() - 1;
        let id = self.id.clone();
        let message = &self.messages[index];
        self.emit(event_types::MESSAGE_ADDED, || {
            json!({ "conversation_id": id, "index": index, "message": message })
        })
    }

    // ── Tool calls ───────────────────────────────────────────────────────────

    /// Add a call that is awaiting approval.
    pub fn add_pending_tool_call(&mut self, call: ToolCall) -> GateResult<()> {
        if !call.is_pending() {
            return Err(GateError::InvalidTransition {
                tool_call_id: call.id().clone(),
                from: call.status(),
                action: "enter the turn as pending",
            });
        }
        self.add_tool_call(call)
    }

    /// Add a call in whatever initial state it was created with.
    ///
    /// Auto-approved calls arrive here already `Executing`.
    pub fn add_tool_call(&mut self, call: ToolCall) -> GateResult<()> {
        if self.tool_call(call.id()).is_some() {
            return Err(GateError::DuplicateToolCall {
                tool_call_id: call.id().clone(),
            });
        }
        info!(
            conversation_id = %self.id,
            tool_call_id = %call.id(),
            tool = %call.name(),
            status = %call.status(),
            "tool call added to turn"
        );
        self.tool_calls.push(call);
        let index = self.tool_calls.len() - 1;
        self.publish(event_types::TOOL_CALL_CREATED, index)
    }

    pub fn approve_tool_call(&mut self, id: &ToolCallId) -> GateResult<()> {
        let index = self.index_of(id)?;
        self.tool_calls[index].approve()?;
        self.publish(event_types::TOOL_CALL_APPROVED, index)
    }

    pub fn reject_tool_call(&mut self, id: &ToolCallId, reason: Option<String>) -> GateResult<()> {
        let index = self.index_of(id)?;
        self.tool_calls[index].reject(reason)?;
        self.publish(event_types::TOOL_CALL_REJECTED, index)
    }

    pub fn start_tool_call(&mut self, id: &ToolCallId) -> GateResult<()> {
        let index = self.index_of(id)?;
        self.tool_calls[index].start_execution()?;
        self.publish(event_types::TOOL_CALL_EXECUTING, index)
    }

    pub fn complete_tool_call(&mut self, id: &ToolCallId, result: impl Into<String>) -> GateResult<()> {
        let index = self.index_of(id)?;
        self.tool_calls[index].complete(result)?;
        self.publish(event_types::TOOL_CALL_COMPLETED, index)
    }

    pub fn fail_tool_call(&mut self, id: &ToolCallId, error: impl Into<String>) -> GateResult<()> {
        let index = self.index_of(id)?;
        self.tool_calls[index].fail(error)?;
        self.publish(event_types::TOOL_CALL_FAILED, index)
    }

    /// Apply a batch of human decisions in order.
    ///
    /// Stops at the first error; decisions before it stay applied.
    pub fn apply_decisions(&mut self, decisions: &[ToolDecision]) -> GateResult<()> {
        for decision in decisions {
            if decision.approved {
                self.approve_tool_call(&decision.tool_call_id)?;
            } else {
                self.reject_tool_call(&decision.tool_call_id, decision.reason.clone())?;
            }
        }
        Ok(())
    }

    /// Mirror the runtime's report for one invocation onto its tool call.
    ///
    /// An approved call is started before it is completed or failed, so the
    /// full lifecycle shows up in the event stream. `Declined` results need no
    /// change: the call is already `Rejected`.
    pub fn record_result(&mut self, result: &InvocationResult) -> GateResult<()> {
        let index = self.index_of(&result.tool_call_id)?;
        if matches!(result.output, InvocationOutput::Declined) {
            return Ok(());
        }
        if self.tool_calls[index].status() == ToolCallStatus::Approved {
            self.start_tool_call(&result.tool_call_id)?;
        }
        match &result.output {
            InvocationOutput::Completed { result: text } => {
                self.complete_tool_call(&result.tool_call_id, text.clone())
            }
            InvocationOutput::Failed { error } => {
                self.fail_tool_call(&result.tool_call_id, error.clone())
            }
            InvocationOutput::Declined => Ok(()),
        }
    }

    /// Archive the current turn's calls once every one of them is terminal.
    pub fn retire_turn(&mut self) -> GateResult<usize> {
        let unresolved = self.tool_calls.iter().filter(|c| !c.is_terminal()).count();
        if unresolved > 0 {
            return Err(GateError::TurnNotResolved { unresolved });
        }
        let retired = self.tool_calls.len();
        self.archived_tool_calls.append(&mut self.tool_calls);
        info!(conversation_id = %self.id, retired, "turn retired");
        let id = self.id.clone();
        self.emit(event_types::TURN_RETIRED, || {
            json!({ "conversation_id": id, "retired": retired })
        })?;
        Ok(retired)
    }

    fn index_of(&self, id: &ToolCallId) -> GateResult<usize> {
        self.tool_calls
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| GateError::ToolCallNotFound { tool_call_id: id.clone() })
    }

    /// Publish a tool-call event for the call at `index`.
    ///
    /// The transition has already been applied when this runs; a handler
    /// failure is reported but does not undo it.
    fn publish(&self, event_type: &str, index: usize) -> GateResult<()> {
        let call = &self.tool_calls[index];
        self.emit(event_type, || tool_call_event(&self.id, call))
    }

    fn emit<F>(&self, event_type: &str, build: F) -> GateResult<()>
    where
        F: FnOnce() -> Value,
    {
        match &self.events {
            Some(registry) => registry.emit(event_type, build),
            None => Ok(()),
        }
    }
}

fn tool_call_event(conversation_id: &str, call: &ToolCall) -> Value {
    json!({
        "conversation_id": conversation_id,
        "tool_call_id": call.id(),
        "tool_name": call.name(),
        "status": call.status(),
        "requires_approval": call.requires_approval(),
        "result": call.result(),
        "error": call.error(),
        "rejection_reason": call.rejection_reason(),
    })
}

// ── Tests ────────────────────────────────────────────────────────────────────
