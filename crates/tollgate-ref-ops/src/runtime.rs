//! A scripted stand-in for a language-model runtime.
//!
//! The "model" here is a fixed plan: a list of tool steps grouped into
//! batches. Batches run in order. Within a batch, auto-approved steps run
//! straight away and gated steps become requirements; the run pauses until
//! every requirement in the batch carries a decision.
//!
//! Payload shape (owned by this runtime, opaque to the core):
//!
//! ```json
//! {
//!   "run_id": "run-1",
//!   "cursor": 0,
//!   "steps": [{ "tool_call_id", "tool_name", "input", "requires_approval", "batch", "done" }],
//!   "requirements": [{ "id", "tool_call_id", "tool_name", "input", "confirmed", "rejection_note" }],
//!   "transcript": ["..."]
//! }
//! ```
//!
//! `confirmed` is `null` until a decision is applied, then `true` or `false`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use tollgate_contracts::{
    error::{GateError, GateResult},
    event::event_types,
    run::{InvocationOutput, InvocationResult, PendingRequirement, RunOutcome},
    tool::ToolCallId,
};
use tollgate_core::{events::EventRegistry, traits::RunRuntime};

use crate::mock_data::execute_tool;

// ── Payload types ─────────────────────────────────────────────────────────────

/// One planned tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub tool_call_id: ToolCallId,
    pub tool_name: String,
    pub input: Value,
    pub requires_approval: bool,
    /// Steps sharing a batch are proposed, and decided, together.
    pub batch: usize,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Requirement {
    id: String,
    tool_call_id: ToolCallId,
    tool_name: String,
    input: Value,
    confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejection_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RunState {
    run_id: String,
    cursor: usize,
    steps: Vec<ScriptStep>,
    #[serde(default)]
    requirements: Vec<Requirement>,
    #[serde(default)]
    transcript: Vec<String>,
}

impl RunState {
    fn parse(payload: &Value) -> GateResult<Self> {
        serde_json::from_value(payload.clone()).map_err(|e| GateError::RuntimeFailed {
            reason: format!("payload is not a scripted run: {}", e),
        })
    }

    fn to_value(&self) -> GateResult<Value> {
        serde_json::to_value(self).map_err(|e| GateError::RuntimeFailed {
            reason: format!("run state could not be serialized: {}", e),
        })
    }

    fn batch_count(&self) -> usize {
        self.steps.iter().map(|s| s.batch + 1).max().unwrap_or(0)
    }

    fn requirement_index(&self, tool_call_id: &ToolCallId) -> Option<usize> {
        self.requirements.iter().position(|r| &r.tool_call_id == tool_call_id)
    }

    fn pending(&self) -> Vec<PendingRequirement> {
        self.requirements
            .iter()
            .filter(|r| r.confirmed.is_none())
            .map(|r| PendingRequirement {
                requirement_id: r.id.clone(),
                tool_call_id: r.tool_call_id.clone(),
                tool_name: r.tool_name.clone(),
                input: r.input.clone(),
            })
            .collect()
    }

    /// The undecided requirement with id `requirement_id`.
    fn open_requirement(&mut self, requirement_id: &str) -> GateResult<&mut Requirement> {
        let run_id = self.run_id.clone();
        self.requirements
            .iter_mut()
            .find(|r| r.id == requirement_id && r.confirmed.is_none())
            .ok_or_else(|| GateError::RuntimeFailed {
                reason: format!("run '{}' has no open requirement '{}'", run_id, requirement_id),
            })
    }
}

/// Requirement id for the requirement gating `tool_call_id`.
pub fn requirement_id_for(tool_call_id: &ToolCallId) -> String {
    format!("req-{}", tool_call_id)
}

// ── Runtime ───────────────────────────────────────────────────────────────────

/// Runs scripted plans against the mock fleet.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRuntime {
    events: Option<Arc<EventRegistry>>,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrated transcript lines are published as `runtime.text_chunk`.
    pub fn with_events(mut self, registry: Arc<EventRegistry>) -> Self {
        self.events = Some(registry);
        self
    }

    /// Build the initial payload for a plan. Nothing runs yet.
    pub fn plan(&self, run_id: impl Into<String>, steps: Vec<ScriptStep>) -> GateResult<Value> {
        RunState {
            run_id: run_id.into(),
            cursor: 0,
            steps,
            requirements: Vec::new(),
            transcript: Vec::new(),
        }
        .to_value()
    }

    /// Run a freshly planned payload until it finishes or needs a human.
    pub fn start(&self, payload: Value) -> GateResult<RunOutcome> {
        self.continue_run(payload)
    }

    fn narrate(&self, state: &mut RunState, line: String) -> GateResult<()> {
        debug!(run_id = %state.run_id, line = %line, "runtime output");
        if let Some(registry) = &self.events {
            registry.emit(event_types::TEXT_CHUNK, || {
                json!({ "run_id": state.run_id, "text": line })
            })?;
        }
        state.transcript.push(line);
        Ok(())
    }

    fn run_step(&self, state: &mut RunState, index: usize) -> GateResult<InvocationResult> {
        let step = state.steps[index].clone();
        let (line, output) = match execute_tool(&step.tool_name, &step.input) {
            Ok(result) => (
                format!("{}: {}", step.tool_name, result),
                InvocationOutput::Completed { result },
            ),
            Err(error) => (
                format!("{} failed: {}", step.tool_name, error),
                InvocationOutput::Failed { error },
            ),
        };
        state.steps[index].done = true;
        self.narrate(state, line)?;
        Ok(InvocationResult { tool_call_id: step.tool_call_id, output })
    }

    fn decline_step(&self, state: &mut RunState, index: usize, note: Option<String>) -> GateResult<InvocationResult> {
        let step = state.steps[index].clone();
        let line = match note {
            Some(note) => format!(
                "operation {} was not performed because it was declined: {}",
                step.tool_name, note
            ),
            None => format!("operation {} was not performed because it was declined", step.tool_name),
        };
        state.steps[index].done = true;
        self.narrate(state, line)?;
        Ok(InvocationResult {
            tool_call_id: step.tool_call_id,
            output: InvocationOutput::Declined,
        })
    }
}

impl RunRuntime for ScriptedRuntime {
    fn pending_requirements(&self, payload: &Value) -> GateResult<Vec<PendingRequirement>> {
        Ok(RunState::parse(payload)?.pending())
    }

    fn confirm(&self, payload: &mut Value, requirement_id: &str) -> GateResult<()> {
        let mut state = RunState::parse(payload)?;
        state.open_requirement(requirement_id)?.confirmed = Some(true);
        *payload = state.to_value()?;
        Ok(())
    }

    fn reject(&self, payload: &mut Value, requirement_id: &str, reason: Option<&str>) -> GateResult<()> {
        let mut state = RunState::parse(payload)?;
        let requirement = state.open_requirement(requirement_id)?;
        requirement.confirmed = Some(false);
        requirement.rejection_note = reason.map(str::to_string);
        *payload = state.to_value()?;
        Ok(())
    }

    fn continue_run(&self, payload: Value) -> GateResult<RunOutcome> {
        let mut state = RunState::parse(&payload)?;
        let mut results = Vec::new();
        let batches = state.batch_count();

        while state.cursor < batches {
            let cursor = state.cursor;
            let mut waiting = false;

            let indices: Vec<usize> = (0..state.steps.len())
                .filter(|&i| state.steps[i].batch == cursor && !state.steps[i].done)
                .collect();

            for index in indices {
                if !state.steps[index].requires_approval {
                    results.push(self.run_step(&mut state, index)?);
                    continue;
                }

                let tool_call_id = state.steps[index].tool_call_id.clone();
                match state.requirement_index(&tool_call_id) {
                    None => {
                        let step = &state.steps[index];
                        state.requirements.push(Requirement {
                            id: requirement_id_for(&tool_call_id),
                            tool_call_id,
                            tool_name: step.tool_name.clone(),
                            input: step.input.clone(),
                            confirmed: None,
                            rejection_note: None,
                        });
                        waiting = true;
                    }
                    Some(r) => {
                        let confirmed = state.requirements[r].confirmed;
                        match confirmed {
                            None => waiting = true,
                            Some(true) => results.push(self.run_step(&mut state, index)?),
                            Some(false) => {
                                let note = state.requirements[r].rejection_note.clone();
                                results.push(self.decline_step(&mut state, index, note)?);
                            }
                        }
                    }
                }
            }

            if waiting {
                let requirements = state.pending();
                info!(
                    run_id = %state.run_id,
                    batch = cursor,
                    requirements = requirements.len(),
                    "run paused for approval"
                );
                return Ok(RunOutcome::Paused {
                    payload: state.to_value()?,
                    requirements,
                    results,
                });
            }

            state.cursor += 1;
        }

        info!(run_id = %state.run_id, steps = state.steps.len(), "run finished");
        let output = if state.transcript.is_empty() {
            "nothing to do".to_string()
        } else {
            state.transcript.join("\n")
        };
        Ok(RunOutcome::Completed { output, results })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
