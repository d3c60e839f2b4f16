//! The turn driver: proposals in, tool calls out.
//!
//! Every proposed invocation passes the same gate, in order:
//!
//!   Registered? → Policy → Validate → ToolCall (Pending | Executing)
//!
//! A proposal that fails a check never becomes a tool call; it is reported
//! back as refused and the rest of the batch carries on.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::{debug, info, warn};

use tollgate_contracts::{
    error::GateResult,
    proposal::{ProposalOutcome, RefusalReason, RefusedProposal},
    tool::{Classification, ProposedInvocation, ToolSpec},
    turn::PendingInvocation,
};

use crate::{
    conversation::Conversation,
    events::EventRegistry,
    tool_call::ToolCall,
    traits::{ApprovalClassifier, InputValidator},
};

/// Gate for one run.
///
/// Classifications are cached per tool name for the gate's lifetime, so a
/// policy change takes effect with the next run's gate, never mid-run.
pub struct ToolGate {
    classifier: Box<dyn ApprovalClassifier>,
    validator: Box<dyn InputValidator>,
    /// Registration order is the order `visible_tools` reports.
    tools: Vec<ToolSpec>,
    cache: Mutex<HashMap<String, Classification>>,
    events: Option<Arc<EventRegistry>>,
}

impl ToolGate {
    pub fn new(classifier: Box<dyn ApprovalClassifier>, validator: Box<dyn InputValidator>) -> Self {
        Self {
            classifier,
            validator,
            tools: Vec::new(),
            cache: Mutex::new(HashMap::new()),
            events: None,
        }
    }

    /// Conversations created through [`ToolGate::conversation`] publish here.
    pub fn with_events(mut self, registry: Arc<EventRegistry>) -> Self {
        self.events = Some(registry);
        self
    }

    /// A fresh conversation wired to this gate's event registry.
    pub fn conversation(&self) -> Conversation {
        match &self.events {
            Some(registry) => Conversation::new().with_events(Arc::clone(registry)),
            None => Conversation::new(),
        }
    }

    /// Add tools to the catalog. A later spec with the same name replaces the earlier one.
    pub fn register_tools(&mut self, specs: Vec<ToolSpec>) {
        for spec in specs {
            match self.tools.iter_mut().find(|t| t.name == spec.name) {
                Some(existing) => *existing = spec,
                None => self.tools.push(spec),
            }
        }
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
        debug!(tools = self.tools.len(), "tool catalog updated");
    }

    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// The catalog the model is allowed to see: every tool not excluded by policy.
    pub fn visible_tools(&self) -> Vec<&ToolSpec> {
        self.tools
            .iter()
            .filter(|t| !self.classify(t).excluded)
            .collect()
    }

    /// Policy decision for one registered tool, cached by name.
    pub fn classify(&self, spec: &ToolSpec) -> Classification {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache.entry(spec.name.clone()).or_insert_with(|| {
            let c = self.classifier.classify(&spec.name, spec.requires_approval);
            debug!(
                tool = %spec.name,
                excluded = c.excluded,
                requires_approval = c.requires_approval,
                "tool classified"
            );
            c
        })
    }

    /// Turn a batch of proposals into tool calls on `conversation`.
    ///
    /// Refused proposals are reported, not errors. `Err` means the
    /// conversation refused a call (e.g. a duplicate id) or the validator
    /// itself faulted; calls added before that point stay added.
    pub fn propose(
        &self,
        conversation: &mut Conversation,
        proposals: Vec<ProposedInvocation>,
    ) -> GateResult<ProposalOutcome> {
        let mut outcome = ProposalOutcome::default();

        for proposal in proposals {
            let ProposedInvocation { id, tool_name, input } = proposal;

            let Some(spec) = self.tool(&tool_name) else {
                warn!(tool = %tool_name, "proposal for unregistered tool refused");
                outcome.refused.push(RefusedProposal { tool_name, id, reason: RefusalReason::UnknownTool });
                continue;
            };

            let classification = self.classify(spec);
            if classification.excluded {
                warn!(tool = %tool_name, "proposal for excluded tool refused");
                outcome.refused.push(RefusedProposal { tool_name, id, reason: RefusalReason::Excluded });
                continue;
            }

            let report = self.validator.validate(spec, &input)?;
            if !report.passed {
                warn!(tool = %tool_name, failures = %report.summary(), "proposal input failed validation");
                outcome.refused.push(RefusedProposal {
                    tool_name,
                    id,
                    reason: RefusalReason::InvalidInput { report },
                });
                continue;
            }

            let call = match id {
                Some(id) => ToolCall::with_id(id, tool_name, input, classification.requires_approval),
                None => ToolCall::new(tool_name, input, classification.requires_approval),
            };

            if call.is_pending() {
                let view = call.to_pending_invocation();
                conversation.add_pending_tool_call(call)?;
                outcome.pending.push(view);
            } else {
                let call_id = call.id().clone();
                conversation.add_tool_call(call)?;
                outcome.auto_approved.push(call_id);
            }
        }

        info!(
            conversation_id = %conversation.id(),
            auto_approved = outcome.auto_approved.len(),
            pending = outcome.pending.len(),
            refused = outcome.refused.len(),
            "proposals gated"
        );
        Ok(outcome)
    }

    /// Pending calls on `conversation`, in the shape shown to the reviewer.
    pub fn pending_invocations(&self, conversation: &Conversation) -> Vec<PendingInvocation> {
        conversation.pending_invocations()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use tollgate_contracts::{
        error::{GateError, GateResult},
        proposal::RefusalReason,
        tool::{Classification, ProposedInvocation, ToolCallStatus, ToolSpec},
        verify::{ValidationFailure, ValidationReport},
    };

    use super::ToolGate;
    use crate::{
        conversation::Conversation,
        traits::{ApprovalClassifier, InputValidator},
    };

    // ── Mocks ────────────────────────────────────────────────────────────────

    /// "secret_*" excluded, "list_*" auto-approved, everything else gated.
    /// Counts calls so caching is observable.
    struct PrefixClassifier {
        calls: Arc<Mutex<usize>>,
    }

    impl ApprovalClassifier for PrefixClassifier {
        fn classify(&self, tool_name: &str, tool_requires_approval: bool) -> Classification {
            *self.calls.lock().unwrap() += 1;
            if tool_name.starts_with("secret_") {
                Classification::EXCLUDED
            } else if tool_requires_approval || !tool_name.starts_with("list_") {
                Classification::GATED
            } else {
                Classification::AUTO_APPROVED
            }
        }
    }

    /// Requires an object input; `{"bad": true}` fails.
    struct ObjectValidator;

    impl InputValidator for ObjectValidator {
        fn validate(&self, _spec: &ToolSpec, input: &Value) -> GateResult<ValidationReport> {
            if input.get("bad").is_some() {
                return Ok(ValidationReport::from_failures(vec![ValidationFailure {
                    check_id: "no-bad".to_string(),
                    message: "input is bad".to_string(),
                }]));
            }
            Ok(ValidationReport::pass())
        }
    }

    fn gate() -> (ToolGate, Arc<Mutex<usize>>) {
        let calls = Arc::new(Mutex::new(0));
        let mut gate = ToolGate::new(
            Box::new(PrefixClassifier { calls: Arc::clone(&calls) }),
            Box::new(ObjectValidator),
        );
        gate.register_tools(vec![
            ToolSpec::new("list_servers", false),
            ToolSpec::new("list_flagged", true),
            ToolSpec::new("server_restart", false),
            ToolSpec::new("secret_rotate", false),
        ]);
        (gate, calls)
    }

    #[test]
    fn visible_tools_hide_excluded() {
        let (gate, _) = gate();
        let names: Vec<&str> = gate.visible_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list_servers", "list_flagged", "server_restart"]);
    }

    #[test]
    fn proposals_split_by_classification() {
        let (gate, _) = gate();
        let mut conv = Conversation::new();

        let outcome = gate
            .propose(
                &mut conv,
                vec![
                    ProposedInvocation::new("list_servers", json!({})),
                    ProposedInvocation::new("server_restart", json!({ "host": "db-01" })).with_id("c2"),
                    ProposedInvocation::new("list_flagged", json!({})),
                ],
            )
            .unwrap();

        assert_eq!(outcome.auto_approved.len(), 1);
        assert_eq!(outcome.pending.len(), 2);
        assert_eq!(outcome.pending[0].id.as_str(), "c2");
        assert!(outcome.needs_approval());

        assert_eq!(conv.tool_calls().len(), 3);
        assert_eq!(conv.tool_calls()[0].status(), ToolCallStatus::Executing);
        assert!(conv.is_blocked());
        assert_eq!(gate.pending_invocations(&conv).len(), 2);
    }

    #[test]
    fn unknown_excluded_and_invalid_are_refused() {
        let (gate, _) = gate();
        let mut conv = Conversation::new();

        let outcome = gate
            .propose(
                &mut conv,
                vec![
                    ProposedInvocation::new("does_not_exist", json!({})),
                    ProposedInvocation::new("secret_rotate", json!({})),
                    ProposedInvocation::new("server_restart", json!({ "bad": true })),
                ],
            )
            .unwrap();

        assert!(conv.tool_calls().is_empty());
        assert_eq!(outcome.refused.len(), 3);
        assert_eq!(outcome.refused[0].reason, RefusalReason::UnknownTool);
        assert_eq!(outcome.refused[1].reason, RefusalReason::Excluded);
        match &outcome.refused[2].reason {
            RefusalReason::InvalidInput { report } => {
                assert!(!report.passed);
                assert_eq!(report.failures[0].check_id, "no-bad");
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn classification_is_cached_per_tool_name() {
        let (gate, calls) = gate();
        let mut conv = Conversation::new();
        let batch = || {
            vec![
                ProposedInvocation::new("list_servers", json!({})),
                ProposedInvocation::new("list_servers", json!({})),
            ]
        };
        gate.propose(&mut conv, batch()).unwrap();
        gate.propose(&mut conv, batch()).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn duplicate_runtime_id_is_an_error() {
        let (gate, _) = gate();
        let mut conv = Conversation::new();
        let result = gate.propose(
            &mut conv,
            vec![
                ProposedInvocation::new("server_restart", json!({})).with_id("same"),
                ProposedInvocation::new("server_restart", json!({})).with_id("same"),
            ],
        );
        assert!(matches!(result, Err(GateError::DuplicateToolCall { .. })));
        assert_eq!(conv.tool_calls().len(), 1);
    }

    #[test]
    fn reregistering_replaces_spec() {
        let (mut gate, _) = gate();
        gate.register_tools(vec![ToolSpec::new("list_servers", true)]);
        assert_eq!(gate.visible_tools().len(), 3);
        assert!(gate.classify(gate.tool("list_servers").unwrap()).requires_approval);
    }
}
