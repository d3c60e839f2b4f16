//! Suspend and resume of runs parked at approval points.
//!
//! The coordinator sits between the session store and the runtime
//! collaborator:
//!
//!   payload → [suspend] → RunSnapshot ... decisions → [resume] → RunOutcome
//!
//! It never interprets the payload. Requirement ids, confirm and reject all go
//! through `RunRuntime`; the bytes go through `SnapshotCodec`.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use tollgate_contracts::{
    error::GateResult,
    event::event_types,
    run::{
        AppliedDecision, Decision, PendingRequirement, ResumeDecisions, ResumeOutcome,
        RunOutcome, RunSnapshot,
    },
    tool::ToolCallId,
};

use crate::{
    events::EventRegistry,
    traits::{RunRuntime, SnapshotCodec},
};

/// Drives suspend/resume for one runtime.
pub struct ResumeCoordinator {
    codec: Box<dyn SnapshotCodec>,
    runtime: Box<dyn RunRuntime>,
    events: Option<Arc<EventRegistry>>,
}

impl ResumeCoordinator {
    pub fn new(codec: Box<dyn SnapshotCodec>, runtime: Box<dyn RunRuntime>) -> Self {
        Self { codec, runtime, events: None }
    }

    pub fn with_events(mut self, registry: Arc<EventRegistry>) -> Self {
        self.events = Some(registry);
        self
    }

    /// Encode a paused run for storage between turns.
    pub fn suspend(&self, payload: &Value) -> GateResult<RunSnapshot> {
        let requirement_ids = self.runtime.requirement_ids(payload)?;
        let encoded = self.codec.encode(payload)?;
        info!(
            requirements = requirement_ids.len(),
            encoded_len = encoded.len(),
            "run suspended"
        );
        self.emit(event_types::RUN_SUSPENDED, || {
            json!({ "requirement_ids": requirement_ids, "encoded_len": encoded.len() })
        })?;
        Ok(RunSnapshot { encoded, requirement_ids })
    }

    /// Re-encode the payload of a run that paused again.
    ///
    /// Returns `None` when the run completed and there is nothing to store.
    pub fn resnapshot(&self, outcome: &RunOutcome) -> GateResult<Option<RunSnapshot>> {
        match outcome {
            RunOutcome::Paused { payload, .. } => self.suspend(payload).map(Some),
            RunOutcome::Completed { .. } => Ok(None),
        }
    }

    /// The requirements a stored snapshot is waiting on, in payload order.
    pub fn requirements(&self, encoded: &str) -> GateResult<Vec<PendingRequirement>> {
        let payload = self.codec.decode(encoded)?;
        self.runtime.pending_requirements(&payload)
    }

    /// Map tool-call ids to requirement ids for a stored snapshot.
    pub fn requirement_map(&self, encoded: &str) -> GateResult<HashMap<ToolCallId, String>> {
        Ok(self
            .requirements(encoded)?
            .into_iter()
            .map(|r| (r.tool_call_id, r.requirement_id))
            .collect())
    }

    /// Resume with two plain id sets.
    pub fn resume(
        &self,
        encoded: &str,
        approved: &HashSet<String>,
        rejected: &HashSet<String>,
    ) -> GateResult<ResumeOutcome> {
        self.resume_with(encoded, &ResumeDecisions::from_sets(approved, rejected))
    }

    /// Apply `decisions` to a stored run and continue it.
    ///
    /// # Pipeline
    ///
    /// 1. Decode the snapshot (`CorruptSnapshot` on failure; nothing else runs)
    /// 2. Read the requirement ids through the runtime, in payload order
    /// 3. For each id: rejected → `reject`; approved → `confirm`; neither →
    ///    unresolved. An id in both sets is rejected.
    /// 4. Hand the marked payload to `continue_run`
    ///
    /// Unresolved requirements are left unmarked and reported; the runtime
    /// decides what an unmarked requirement means when it continues.
    ///
    /// Event handler failures never fail a resume: they are returned in
    /// `ResumeOutcome::handler_failures`. Only decode, runtime and marking
    /// errors are `Err`.
    pub fn resume_with(&self, encoded: &str, decisions: &ResumeDecisions) -> GateResult<ResumeOutcome> {
        let mut payload = self.codec.decode(encoded)?;
        let requirement_ids = self.runtime.requirement_ids(&payload)?;

        debug!(
            requirements = requirement_ids.len(),
            approved = decisions.approved.len(),
            rejected = decisions.rejected.len(),
            "resume starting"
        );

        let known: HashSet<&str> = requirement_ids.iter().map(String::as_str).collect();
        let mut unknown_ids: Vec<String> = decisions
            .approved
            .iter()
            .chain(decisions.rejected.keys())
            .filter(|id| !known.contains(id.as_str()))
            .cloned()
            .collect();
        unknown_ids.sort();
        unknown_ids.dedup();
        if !unknown_ids.is_empty() {
            warn!(unknown = ?unknown_ids, "decisions reference requirements not in the run");
        }

        let mut applied = Vec::with_capacity(requirement_ids.len());
        let mut unresolved = Vec::new();
        let mut handler_failures = Vec::new();

        for requirement_id in &requirement_ids {
            let approved = decisions.approved.contains(requirement_id);
            let decision = match decisions.rejected.get(requirement_id) {
                Some(reason) => {
                    if approved {
                        warn!(
                            requirement_id = %requirement_id,
                            "requirement both approved and rejected; rejecting"
                        );
                    }
                    self.runtime.reject(&mut payload, requirement_id, reason.as_deref())?;
                    Decision::Rejected { reason: reason.clone() }
                }
                None if approved => {
                    self.runtime.confirm(&mut payload, requirement_id)?;
                    Decision::Confirmed
                }
                None => {
                    warn!(requirement_id = %requirement_id, "requirement left unresolved");
                    self.observe(&mut handler_failures, event_types::REQUIREMENT_UNRESOLVED, || {
                        json!({ "requirement_id": requirement_id })
                    });
                    unresolved.push(requirement_id.clone());
                    continue;
                }
            };
            debug!(requirement_id = %requirement_id, decision = ?decision, "decision applied");
            applied.push(AppliedDecision {
                requirement_id: requirement_id.clone(),
                decision,
            });
        }

        self.observe(&mut handler_failures, event_types::RUN_RESUMED, || {
            json!({ "applied": applied, "unresolved": unresolved, "unknown_ids": unknown_ids })
        });

        let run = self.runtime.continue_run(payload)?;
        match &run {
            RunOutcome::Completed { output, results } => {
                info!(results = results.len(), "run completed");
                self.observe(&mut handler_failures, event_types::RUN_COMPLETED, || {
                    json!({ "output": output, "results": results })
                });
            }
            RunOutcome::Paused { requirements, .. } => {
                info!(requirements = requirements.len(), "run paused again");
            }
        }

        Ok(ResumeOutcome { run, applied, unresolved, unknown_ids, handler_failures })
    }

    /// Emit an event whose observers must not abort a resume in progress.
    ///
    /// Once a decision is marked, or the runtime has run the approved tools,
    /// the outcome has to reach the caller. Failures are logged and collected.
    fn observe<F>(&self, failures: &mut Vec<String>, event_type: &str, build: F)
    where
        F: FnOnce() -> Value,
    {
        if let Err(e) = self.emit(event_type, build) {
            warn!(event_type = %event_type, error = %e, "event handler failed during resume");
            failures.push(e.to_string());
        }
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

// ── Tests ────────────────────────────────────────────────────────────────────
