//! Operations desk demo scenarios.
//!
//! Each scenario builds its own [`crate::desk::OpsDesk`] with a fresh audit
//! stream, drives one or more turns through it and verifies the audit chain
//! at the end.

pub mod batch_decision;
pub mod pause_again;
pub mod policy_walkthrough;

use tollgate_contracts::{
    error::{GateError, GateResult},
    turn::TurnResponse,
};

use crate::desk::OpsDesk;

pub(crate) fn print_response(response: &TurnResponse) {
    if response.is_awaiting_approval() {
        println!("  Awaiting approval:      {} call(s)", response.pending.len());
        for p in &response.pending {
            println!("    - {} {} {}", p.id.as_str(), p.tool_name, p.input);
        }
    }
    if let Some(text) = &response.result {
        println!("  Assistant:");
        for line in text.lines() {
            println!("    {}", line);
        }
    }
}

/// Print and check the desk's audit chain, then seal it.
pub(crate) fn close_audit(desk: &OpsDesk) -> GateResult<()> {
    let audit = desk.audit();
    let integrity_ok = audit.verify_integrity();
    println!(
        "  Audit chain integrity:  {} ({} event(s))",
        if integrity_ok { "VERIFIED" } else { "FAILED" },
        audit.len()
    );
    if !integrity_ok {
        return Err(GateError::AuditWriteFailed {
            reason: format!("audit chain for '{}' does not verify", audit.stream_id()),
        });
    }
    let terminal = audit.finalize()?;
    println!("  Terminal hash:          {}", &terminal[..16.min(terminal.len())]);
    Ok(())
}
