//! Schema-based input validator.
//!
//! `SchemaVerifier` implements the `InputValidator` trait from
//! `tollgate-core`. A proposed input is checked in two phases:
//!
//! 1. **Structural**: the input must be a JSON object and, when the tool
//!    declares one, satisfy its `input_schema` (via `jsonschema`).
//! 2. **Custom**: every check registered for the tool name runs in
//!    registration order.
//!
//! All failures are collected before returning, so a reviewer sees the whole
//! picture in one report.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use tollgate_contracts::{
    error::GateResult,
    tool::ToolSpec,
    verify::{ValidationFailure, ValidationReport},
};
use tollgate_core::traits::InputValidator;

/// A caller-supplied check over one tool's input.
///
/// Returns `Some(message)` when the check fails, `None` when it passes.
pub type CustomCheckFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Check id used for structural failures.
pub const SCHEMA_CHECK_ID: &str = "json-schema";

struct NamedCheck {
    check_id: String,
    check: CustomCheckFn,
}

/// The default `InputValidator`.
pub struct SchemaVerifier {
    /// Tool name → checks, in registration order.
    custom_checks: HashMap<String, Vec<NamedCheck>>,
}

impl SchemaVerifier {
    pub fn new() -> Self {
        Self {
            custom_checks: HashMap::new(),
        }
    }

    /// Register a named check for `tool_name`.
    ///
    /// Registering the same `check_id` twice for one tool replaces the
    /// earlier check in place.
    pub fn register_check(
        &mut self,
        tool_name: impl Into<String>,
        check_id: impl Into<String>,
        check: CustomCheckFn,
    ) {
        let check_id = check_id.into();
        let checks = self.custom_checks.entry(tool_name.into()).or_default();
        match checks.iter_mut().find(|c| c.check_id == check_id) {
            Some(existing) => existing.check = check,
            None => checks.push(NamedCheck { check_id, check }),
        }
    }

    /// Number of custom checks registered for `tool_name`.
    pub fn check_count(&self, tool_name: &str) -> usize {
        self.custom_checks.get(tool_name).map_or(0, Vec::len)
    }

    fn structural(spec: &ToolSpec, input: &Value, failures: &mut Vec<ValidationFailure>) {
        if !input.is_object() {
            failures.push(ValidationFailure {
                check_id: SCHEMA_CHECK_ID.to_string(),
                message: format!("tool input must be a JSON object, got {}", kind(input)),
            });
            return;
        }

        // A null schema means the tool accepts any object.
        if spec.input_schema.is_null() {
            return;
        }

        match jsonschema::validator_for(&spec.input_schema) {
            Ok(validator) => {
                for error in validator.iter_errors(input) {
                    let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                    warn!(tool = %spec.name, %message, "structural validation failure");
                    failures.push(ValidationFailure {
                        check_id: SCHEMA_CHECK_ID.to_string(),
                        message,
                    });
                }
            }
            Err(e) => {
                // A broken schema fails every call to the tool, so the
                // misconfiguration surfaces on first use.
                let message = format!("invalid JSON Schema document: {e}");
                warn!(tool = %spec.name, %message, "schema compilation failure");
                failures.push(ValidationFailure {
                    check_id: SCHEMA_CHECK_ID.to_string(),
                    message,
                });
            }
        }
    }
}

impl Default for SchemaVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl InputValidator for SchemaVerifier {
    fn validate(&self, spec: &ToolSpec, input: &Value) -> GateResult<ValidationReport> {
        let mut failures = Vec::new();

        // ── Phase 1: structure ───────────────────────────────────────────────
        Self::structural(spec, input, &mut failures);

        // ── Phase 2: custom checks ───────────────────────────────────────────
        for named in self.custom_checks.get(&spec.name).into_iter().flatten() {
            debug!(tool = %spec.name, check_id = %named.check_id, "running custom check");
            if let Some(message) = (named.check)(input) {
                warn!(tool = %spec.name, check_id = %named.check_id, %message, "custom check failed");
                failures.push(ValidationFailure {
                    check_id: named.check_id.clone(),
                    message,
                });
            }
        }

        let report = ValidationReport::from_failures(failures);
        debug!(
            tool = %spec.name,
            passed = report.passed,
            failure_count = report.failures.len(),
            "input validation complete"
        );
        Ok(report)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
