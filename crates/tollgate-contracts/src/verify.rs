//! Tool-input validation report types.
//!
//! Before a proposed invocation becomes a tool call, its input is checked
//! against the tool's declared input contract.

use serde::{Deserialize, Serialize};

/// The result of validating one proposed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if every check passed.
    pub passed: bool,
    /// All failures collected during this run. Empty on pass.
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn pass() -> Self {
        Self { passed: true, failures: vec![] }
    }

    pub fn from_failures(failures: Vec<ValidationFailure>) -> Self {
        Self { passed: failures.is_empty(), failures }
    }

    /// "[check] message; [check] message" summary for logs and narration.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.check_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// "json-schema" for structural failures, otherwise the custom check name.
    pub check_id: String,
    pub message: String,
}
