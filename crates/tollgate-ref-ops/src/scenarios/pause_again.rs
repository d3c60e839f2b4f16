//! Scenario 3: Pause Again
//!
//! A replica-first database restart planned as two batches:
//!
//!   batch 0: restart db-02 (replica)
//!   batch 1: restart db-01 (primary), tail db-01 logs
//!
//! The run suspends on batch 0. While it waits, the user's follow-up message
//! is refused. An empty decision set leaves the requirement unresolved and the
//! run stays suspended. Approving db-02 lets batch 0 finish and the run
//! suspends again on the primary; approving that completes the turn.

use serde_json::json;

use tollgate_contracts::{
    error::{GateError, GateResult},
    tool::ProposedInvocation,
    turn::{ToolDecision, TurnRequest},
};

use super::{close_audit, print_response};
use crate::desk::OpsDesk;

const SESSION: &str = "ops-session-3";

fn plan() -> Vec<Vec<ProposedInvocation>> {
    vec![
        vec![ProposedInvocation::new("server_restart", json!({ "host": "db-02" })).with_id("a1")],
        vec![
            ProposedInvocation::new("server_restart", json!({ "host": "db-01" })).with_id("a2"),
            ProposedInvocation::new("logs_get", json!({ "host": "db-01", "lines": 20 })).with_id("a3"),
        ],
    ]
}

fn decide(decisions: Vec<ToolDecision>) -> TurnRequest {
    TurnRequest { messages: Vec::new(), decisions }
}

pub fn run_scenario() -> GateResult<()> {
    println!("=== Scenario 3: Pause Again ===");
    println!();

    let desk = OpsDesk::new("ops-pause-again")?;
    let mut conv = desk.conversation();

    println!("  User: restart the database pair, replica first");
    let report = desk.start_turn(&mut conv, SESSION, "Restart the database pair, replica first.", plan())?;
    print_response(&report.response);
    println!();

    match conv.add_user_message("also check web-01 while you're at it") {
        Err(GateError::ConversationBlocked { pending }) => {
            println!("  Follow-up message:      refused ({} call(s) awaiting approval)", pending);
        }
        Err(e) => return Err(e),
        Ok(()) => println!("  Follow-up message:      unexpectedly accepted"),
    }
    println!();

    println!("  Operator: submits no decisions");
    let report = desk.continue_turn(&mut conv, SESSION, &decide(Vec::new()))?;
    if let Some(resume) = &report.resume {
        println!("  Unresolved:             {}", resume.unresolved.join(", "));
    }
    print_response(&report.response);
    println!();

    println!("  Operator: approve a1 (db-02)");
    let report = desk.continue_turn(&mut conv, SESSION, &decide(vec![ToolDecision::approve("a1")]))?;
    print_response(&report.response);
    println!();

    println!("  Operator: approve a2 (db-01)");
    let report = desk.continue_turn(&mut conv, SESSION, &decide(vec![ToolDecision::approve("a2")]))?;
    print_response(&report.response);
    println!("  Conversation blocked:   {}", conv.is_blocked());
    println!("  Calls archived:         {}", conv.archived_tool_calls().len());

    close_audit(&desk)?;
    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
