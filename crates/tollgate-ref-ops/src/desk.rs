//! The operations desk: one host process wiring every Tollgate component.
//!
//! A turn flows through the desk like this:
//!
//!   user message → ToolGate (policy + validation) → ScriptedRuntime
//!     → paused?  → ResumeCoordinator::suspend → session store
//!     → decisions → Conversation + ResumeCoordinator::resume → ...
//!
//! Every lifecycle event lands in the desk's audit chain.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use tollgate_audit::InMemoryAuditWriter;
use tollgate_contracts::{
    error::{GateError, GateResult},
    event::event_types,
    proposal::{RefusalReason, RefusedProposal},
    run::{ResumeDecisions, ResumeOutcome, RunOutcome},
    tool::{ProposedInvocation, ToolSpec},
    turn::{PendingInvocation, ToolDecision, TurnRequest, TurnResponse},
};
use tollgate_core::{
    traits::SnapshotStore, Conversation, EventRegistry, ResumeCoordinator, ToolCall, ToolGate,
};
use tollgate_policy::ApprovalPolicy;
use tollgate_snapshot::{CompressedJsonCodec, InMemorySnapshotStore};
use tollgate_verify::SchemaVerifier;

use crate::{
    mock_data::{ops_catalog, CURRENT_SCHEMA_VERSION},
    runtime::{ScriptStep, ScriptedRuntime},
};

// ── Policy TOML ───────────────────────────────────────────────────────────────

/// Embedded operations desk policy.
pub const OPS_POLICY: &str = include_str!("../policies/ops.toml");

/// Session field budget for one suspended run, in bytes.
pub const SESSION_LIMIT: usize = 4096;

/// What one turn produced.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub response: TurnResponse,
    /// Proposals the gate refused this turn.
    pub refused: Vec<RefusedProposal>,
    /// Present when the turn resumed a suspended run.
    pub resume: Option<ResumeOutcome>,
}

/// One desk serves one audit stream.
pub struct OpsDesk {
    gate: ToolGate,
    coordinator: ResumeCoordinator,
    runtime: ScriptedRuntime,
    store: InMemorySnapshotStore,
    registry: Arc<EventRegistry>,
    audit: InMemoryAuditWriter,
}

impl OpsDesk {
    /// Build a desk with the embedded policy and the mock tool catalog.
    pub fn new(stream_id: impl Into<String>) -> GateResult<Self> {
        Self::with_policy(stream_id, ApprovalPolicy::from_toml_str(OPS_POLICY)?)
    }

    pub fn with_policy(stream_id: impl Into<String>, policy: ApprovalPolicy) -> GateResult<Self> {
        let registry = Arc::new(EventRegistry::new());
        let audit = InMemoryAuditWriter::new(stream_id);
        registry.subscribe(event_types::WILDCARD, Arc::new(audit.clone()));

        let mut gate = ToolGate::new(Box::new(policy), Box::new(ops_verifier()))
            .with_events(Arc::clone(&registry));
        gate.register_tools(ops_catalog());

        let runtime = ScriptedRuntime::new().with_events(Arc::clone(&registry));
        let coordinator = ResumeCoordinator::new(
            Box::new(CompressedJsonCodec::new().with_max_encoded_len(SESSION_LIMIT)),
            Box::new(runtime.clone()),
        )
        .with_events(Arc::clone(&registry));

        Ok(Self {
            gate,
            coordinator,
            runtime,
            store: InMemorySnapshotStore::new().with_max_value_len(SESSION_LIMIT),
            registry,
            audit,
        })
    }

    /// A new conversation publishing to this desk's audit chain.
    pub fn conversation(&self) -> Conversation {
        self.gate.conversation()
    }

    /// The tools the model may be offered.
    pub fn visible_tools(&self) -> Vec<&ToolSpec> {
        self.gate.visible_tools()
    }

    pub fn gate(&self) -> &ToolGate {
        &self.gate
    }

    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    pub fn audit(&self) -> &InMemoryAuditWriter {
        &self.audit
    }

    /// True while a run for `session_id` is parked in the session store.
    pub fn has_suspended_run(&self, session_id: &str) -> GateResult<bool> {
        Ok(self.store.get(session_id)?.is_some())
    }

    /// Encoded size of the parked run, if any.
    pub fn suspended_len(&self, session_id: &str) -> GateResult<Option<usize>> {
        Ok(self.store.get(session_id)?.map(|s| s.len()))
    }

    /// Open a turn: record the user message, gate the model's plan and run it.
    ///
    /// `plan` is the model's proposals, one inner list per batch.
    pub fn start_turn(
        &self,
        conversation: &mut Conversation,
        session_id: &str,
        user_message: &str,
        plan: Vec<Vec<ProposedInvocation>>,
    ) -> GateResult<TurnReport> {
        conversation.add_user_message(user_message)?;

        let mut steps = Vec::new();
        let mut refused = Vec::new();
        for (batch, proposals) in plan.into_iter().enumerate() {
            let before = conversation.tool_calls().len();
            let outcome = self.gate.propose(conversation, proposals)?;
            steps.extend(
                conversation.tool_calls()[before..]
                    .iter()
                    .map(|call| script_step(call, batch)),
            );
            for r in &outcome.refused {
                conversation.add_assistant_message(refusal_line(r))?;
            }
            refused.extend(outcome.refused);
        }

        info!(
            conversation_id = %conversation.id(),
            session_id = %session_id,
            steps = steps.len(),
            refused = refused.len(),
            "turn planned"
        );

        let run = self.runtime.start(self.runtime.plan(session_id, steps)?)?;
        let response = self.settle(conversation, session_id, &run)?;
        Ok(TurnReport { response, refused, resume: None })
    }

    /// Continue a suspended run with the decisions carried by `request`.
    ///
    /// Decisions for calls the run is not currently waiting on are left out
    /// of the conversation and reported as unknown by the resume.
    pub fn continue_turn(
        &self,
        conversation: &mut Conversation,
        session_id: &str,
        request: &TurnRequest,
    ) -> GateResult<TurnReport> {
        let encoded = self.store.get(session_id)?.ok_or_else(|| GateError::RuntimeFailed {
            reason: format!("no suspended run for session '{}'", session_id),
        })?;

        let mapping = self.coordinator.requirement_map(&encoded)?;
        let (current, stray): (Vec<ToolDecision>, Vec<ToolDecision>) = request
            .decisions
            .iter()
            .cloned()
            .partition(|d| mapping.contains_key(&d.tool_call_id));
        if !stray.is_empty() {
            warn!(session_id = %session_id, stray = stray.len(), "decisions for calls the run is not waiting on");
        }

        conversation.apply_decisions(&current)?;

        let decisions = ResumeDecisions::from_tool_decisions(&request.decisions, &mapping);
        let resume = self.coordinator.resume_with(&encoded, &decisions)?;
        let response = self.settle(conversation, session_id, &resume.run)?;

        Ok(TurnReport { response, refused: Vec::new(), resume: Some(resume) })
    }

    /// Mirror the runtime's progress onto the conversation and the session store.
    fn settle(&self, conversation: &mut Conversation, session_id: &str, run: &RunOutcome) -> GateResult<TurnResponse> {
        for result in run.results() {
            conversation.record_result(result)?;
        }

        match self.coordinator.resnapshot(run)? {
            Some(snapshot) => {
                self.store.put(session_id, snapshot.encoded)?;
            }
            None => {
                self.store.remove(session_id)?;
            }
        }

        match run {
            RunOutcome::Paused { requirements, .. } => Ok(TurnResponse {
                pending: requirements
                    .iter()
                    .map(|r| PendingInvocation {
                        id: r.tool_call_id.clone(),
                        tool_name: r.tool_name.clone(),
                        input: r.input.clone(),
                    })
                    .collect(),
                result: None,
            }),
            RunOutcome::Completed { output, .. } => {
                conversation.add_assistant_message(output.clone())?;
                if conversation.is_turn_resolved() {
                    conversation.retire_turn()?;
                }
                Ok(TurnResponse { pending: Vec::new(), result: Some(output.clone()) })
            }
        }
    }
}

/// Input checks that JSON Schema cannot express.
fn ops_verifier() -> SchemaVerifier {
    let mut verifier = SchemaVerifier::new();
    verifier.register_check(
        "db_migrate",
        "single-step-migration",
        Box::new(|input: &Value| {
            let target = input["target_version"].as_u64()?;
            (target > CURRENT_SCHEMA_VERSION + 1).then(|| {
                format!(
                    "migrations must move one version at a time (current {}, requested {})",
                    CURRENT_SCHEMA_VERSION, target
                )
            })
        }),
    );
    verifier
}

fn script_step(call: &ToolCall, batch: usize) -> ScriptStep {
    ScriptStep {
        tool_call_id: call.id().clone(),
        tool_name: call.name().to_string(),
        input: call.input().clone(),
        requires_approval: call.requires_approval(),
        batch,
        done: false,
    }
}

fn refusal_line(refused: &RefusedProposal) -> String {
    match &refused.reason {
        RefusalReason::UnknownTool => format!("{} is not a tool on this desk", refused.tool_name),
        RefusalReason::Excluded => format!("{} is not available to the assistant", refused.tool_name),
        RefusalReason::InvalidInput { report } => {
            format!("{} was not proposed: {}", refused.tool_name, report.summary())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
