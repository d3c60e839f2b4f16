//! Results of running proposed invocations through the gate.

use serde::{Deserialize, Serialize};

use crate::{
    tool::ToolCallId,
    turn::PendingInvocation,
    verify::ValidationReport,
};

/// Why a proposal never became a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RefusalReason {
    /// No tool with that name is registered with the gate.
    UnknownTool,
    /// The approval policy excludes the tool for this run.
    Excluded,
    /// The input does not satisfy the tool's input contract.
    InvalidInput { report: ValidationReport },
}

/// A proposal the gate refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefusedProposal {
    pub tool_name: String,
    pub id: Option<ToolCallId>,
    pub reason: RefusalReason,
}

/// What the gate did with one batch of proposals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalOutcome {
    /// Calls created in `Executing`; the runtime may run them now.
    pub auto_approved: Vec<ToolCallId>,
    /// Calls created in `Pending`, in the shape shown to the human.
    pub pending: Vec<PendingInvocation>,
    pub refused: Vec<RefusedProposal>,
}

impl ProposalOutcome {
    pub fn needs_approval(&self) -> bool {
        !self.pending.is_empty()
    }
}
