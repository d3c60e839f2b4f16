//! TOML-driven approval policy.
//!
//! `ApprovalPolicy` loads an `ApprovalPolicyConfig` from a TOML string or file
//! and implements the `ApprovalClassifier` trait from tollgate-core.
//!
//! Classification algorithm, first match wins:
//!
//! 1. Matches `exclude_patterns` (or misses a non-empty `include_patterns`)
//!    → excluded. Exclusion beats every other rule, auto-approve included.
//! 2. The tool's own `requires_approval` flag → gated.
//! 3. Listed in `high_risk_names` → gated.
//! 4. Matches `auto_approve_patterns` → auto-approved.
//! 5. Otherwise → gated (default-safe).

use std::{collections::HashSet, path::Path};

use tracing::debug;

use tollgate_contracts::{
    error::{GateError, GateResult},
    tool::{Classification, ToolSpec},
};
use tollgate_core::traits::ApprovalClassifier;

use crate::{config::ApprovalPolicyConfig, pattern::PatternSet};

/// An `ApprovalClassifier` built from pattern lists.
///
/// ```rust,ignore
/// use tollgate_policy::ApprovalPolicy;
///
/// let policy = ApprovalPolicy::from_file(Path::new("policies/ops.toml"))?;
/// ```
#[derive(Debug, Clone)]
pub struct ApprovalPolicy {
    config: ApprovalPolicyConfig,
    include: PatternSet,
    exclude: PatternSet,
    auto_approve: PatternSet,
    high_risk: HashSet<String>,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new(ApprovalPolicyConfig::default())
    }
}

impl ApprovalPolicy {
    /// Compile the pattern lists once.
    pub fn new(config: ApprovalPolicyConfig) -> Self {
        Self {
            include: PatternSet::new(&config.include_patterns),
            exclude: PatternSet::new(&config.exclude_patterns),
            auto_approve: PatternSet::new(&config.auto_approve_patterns),
            high_risk: config.high_risk_names.iter().cloned().collect(),
            config,
        }
    }

    /// Parse `s` as TOML.
    ///
    /// Returns `GateError::ConfigError` if the TOML is malformed or does not
    /// match `ApprovalPolicyConfig`.
    pub fn from_toml_str(s: &str) -> GateResult<Self> {
        let config: ApprovalPolicyConfig = toml::from_str(s).map_err(|e| GateError::ConfigError {
            reason: format!("failed to parse approval policy TOML: {}", e),
        })?;
        Ok(Self::new(config))
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> GateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GateError::ConfigError {
            reason: format!("failed to read policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn config(&self) -> &ApprovalPolicyConfig {
        &self.config
    }

    /// True when the tool must never be offered for this run.
    pub fn is_excluded(&self, tool_name: &str) -> bool {
        self.exclude.is_match(tool_name)
            || (!self.include.is_empty() && !self.include.is_match(tool_name))
    }

    /// The subset of `tools` the model may see, in their original order.
    pub fn visible_tools(&self, tools: &[ToolSpec]) -> Vec<ToolSpec> {
        tools
            .iter()
            .filter(|t| !self.is_excluded(&t.name))
            .cloned()
            .collect()
    }
}

impl ApprovalClassifier for ApprovalPolicy {
    fn classify(&self, tool_name: &str, tool_requires_approval: bool) -> Classification {
        let (classification, rule) = if self.is_excluded(tool_name) {
            (Classification::EXCLUDED, "excluded")
        } else if tool_requires_approval {
            (Classification::GATED, "tool flag")
        } else if self.high_risk.contains(tool_name) {
            (Classification::GATED, "high risk")
        } else if self.auto_approve.is_match(tool_name) {
            (Classification::AUTO_APPROVED, "auto-approve pattern")
        } else {
            (Classification::GATED, "default")
        };

        debug!(
            tool = %tool_name,
            rule,
            excluded = classification.excluded,
            requires_approval = classification.requires_approval,
            "approval policy applied"
        );
        classification
    }
}
