//! Suspended-run types.
//!
//! The runtime collaborator owns the shape of an in-flight run. Tollgate only
//! ever holds it as an opaque `serde_json::Value`, reaches into it through the
//! runtime's own accessors, and stores it as a `RunSnapshot` between turns.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{tool::ToolCallId, turn::ToolDecision};

/// The stored form of a suspended run.
///
/// `encoded` is the codec output and is the only thing that needs to be
/// persisted; `requirement_ids` is carried alongside for display and for
/// mapping decisions without decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub encoded: String,
    /// Pending requirement ids in payload order.
    pub requirement_ids: Vec<String>,
}

/// One point inside a suspended run waiting for confirm/reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequirement {
    /// Runtime-defined requirement id.
    pub requirement_id: String,
    /// The tool invocation this requirement gates.
    pub tool_call_id: ToolCallId,
    pub tool_name: String,
    pub input: serde_json::Value,
}

/// How one invocation ended inside the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutput {
    Completed { result: String },
    Failed { error: String },
    /// The invocation was declined and the runtime narrated that instead.
    Declined,
}

/// The runtime's report for one invocation it executed or skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub tool_call_id: ToolCallId,
    pub output: InvocationOutput,
}

/// What the runtime collaborator reports after running or continuing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The run finished; `output` is the final user-visible text.
    Completed {
        output: String,
        #[serde(default)]
        results: Vec<InvocationResult>,
    },
    /// The run stopped again at one or more gated invocations.
    Paused {
        payload: serde_json::Value,
        requirements: Vec<PendingRequirement>,
        #[serde(default)]
        results: Vec<InvocationResult>,
    },
}

impl RunOutcome {
    /// Invocation results reported since the previous pause.
    pub fn results(&self) -> &[InvocationResult] {
        match self {
            Self::Completed { results, .. } | Self::Paused { results, .. } => results,
        }
    }
}

/// The decision applied to one requirement during a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Confirmed,
    Rejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// A decision as it was applied, in payload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDecision {
    pub requirement_id: String,
    pub decision: Decision,
}

/// Requirement-keyed decisions for one resume call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeDecisions {
    pub approved: HashSet<String>,
    /// Rejected requirement id → optional human reason.
    pub rejected: HashMap<String, Option<String>>,
}

impl ResumeDecisions {
    /// Build from two plain id sets (no rejection reasons).
    pub fn from_sets(approved: &HashSet<String>, rejected: &HashSet<String>) -> Self {
        Self {
            approved: approved.clone(),
            rejected: rejected.iter().map(|id| (id.clone(), None)).collect(),
        }
    }

    /// Translate invocation-keyed decisions into requirement-keyed ones.
    ///
    /// `mapping` goes from tool-call id to requirement id. Decisions whose
    /// tool-call id has no mapping are keyed by the tool-call id itself, so
    /// runtimes that reuse call ids as requirement ids need no mapping.
    pub fn from_tool_decisions(
        decisions: &[ToolDecision],
        mapping: &HashMap<ToolCallId, String>,
    ) -> Self {
        let mut out = Self::default();
        for decision in decisions {
            let requirement_id = mapping
                .get(&decision.tool_call_id)
                .cloned()
                .unwrap_or_else(|| decision.tool_call_id.0.clone());
            if decision.approved {
                out.approved.insert(requirement_id);
            } else {
                out.rejected.insert(requirement_id, decision.reason.clone());
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.approved.is_empty() && self.rejected.is_empty()
    }
}

/// Everything a resume produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeOutcome {
    /// What the runtime's continuation returned.
    pub run: RunOutcome,
    /// Decisions applied, in payload order.
    pub applied: Vec<AppliedDecision>,
    /// Requirement ids present in the payload but in neither decision set.
    pub unresolved: Vec<String>,
    /// Decision ids that matched no requirement in the payload.
    pub unknown_ids: Vec<String>,
    /// Event handler failures raised while resuming. The resume itself
    /// still completed; `run` is authoritative.
    pub handler_failures: Vec<String>,
}

impl ResumeOutcome {
    pub fn is_paused(&self) -> bool {
        matches!(self.run, RunOutcome::Paused { .. })
    }
}
