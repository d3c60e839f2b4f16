//! Lifecycle event subscription registry.
//!
//! A table from event-type string to an ordered list of handlers. Producers
//! call [`EventRegistry::emit`] with a closure so the event body is only built
//! when somebody is listening.
//!
//! Dispatch is collect-and-report: every handler subscribed to the type runs,
//! in subscription order, even when an earlier one fails. Failures are
//! returned together as `GateError::HandlerFailed` once all have run.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use serde_json::Value;
use tracing::{debug, warn};

use tollgate_contracts::{
    error::{GateError, GateResult},
    event::{event_types::WILDCARD, Event},
};

use crate::traits::EventHandler;

/// Adapter so plain closures can subscribe without a named type.
struct FnHandler<F>(F);

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&Event) -> Result<(), String> + Send + Sync,
{
    fn handle(&self, event: &Event) -> GateResult<()> {
        (self.0)(event).map_err(|reason| GateError::HandlerFailed {
            event_type: event.event_type.clone(),
            failures: vec![reason],
        })
    }
}

/// Subscription table keyed by event type.
///
/// Shared as `Arc<EventRegistry>`; subscribing and dispatching both take
/// `&self`. Handlers are invoked outside the lock, so a handler may subscribe
/// further handlers without deadlocking.
#[derive(Default)]
pub struct EventRegistry {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `event_type`.
    ///
    /// Subscribing under `"*"` receives every event, after the handlers
    /// registered for the specific type.
    pub fn subscribe(&self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let event_type = event_type.into();
        debug!(event_type = %event_type, "event handler subscribed");
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Subscribe a closure. An `Err(message)` is reported as a handler failure.
    pub fn subscribe_fn<F>(&self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(&Event) -> Result<(), String> + Send + Sync + 'static,
    {
        self.subscribe(event_type, Arc::new(FnHandler(handler)));
    }

    /// True when dispatching `event_type` would reach at least one handler.
    pub fn has_subscribers(&self, event_type: &str) -> bool {
        self.subscriber_count(event_type) > 0
    }

    /// Number of handlers a dispatch of `event_type` would invoke.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let specific = handlers.get(event_type).map_or(0, Vec::len);
        let wildcard = if event_type == WILDCARD {
            0
        } else {
            handlers.get(WILDCARD).map_or(0, Vec::len)
        };
        specific + wildcard
    }

    /// Build the event only if somebody is subscribed, then dispatch it.
    pub fn emit<F>(&self, event_type: &str, build: F) -> GateResult<()>
    where
        F: FnOnce() -> Value,
    {
        if !self.has_subscribers(event_type) {
            return Ok(());
        }
        self.dispatch(event_type, build())
    }

    /// Wrap `data` in an [`Event`] and deliver it.
    pub fn dispatch(&self, event_type: &str, data: Value) -> GateResult<()> {
        self.dispatch_event(&Event::new(event_type, data))
    }

    /// Deliver an already-built event to every matching handler in order.
    pub fn dispatch_event(&self, event: &Event) -> GateResult<()> {
        let targets = self.handlers_for(&event.event_type);
        if targets.is_empty() {
            return Ok(());
        }

        let mut failures = Vec::new();
        for handler in &targets {
            if let Err(e) = handler.handle(event) {
                failures.push(match e {
                    GateError::HandlerFailed { failures, .. } => failures.join("; "),
                    other => other.to_string(),
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            warn!(
                event_type = %event.event_type,
                failed = failures.len(),
                handlers = targets.len(),
                "event handlers failed"
            );
            Err(GateError::HandlerFailed {
                event_type: event.event_type.clone(),
                failures,
            })
        }
    }

    /// Snapshot of the handlers for `event_type`, specific ones first.
    fn handlers_for(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<Arc<dyn EventHandler>> =
            handlers.get(event_type).cloned().unwrap_or_default();
        if event_type != WILDCARD {
            if let Some(all) = handlers.get(WILDCARD) {
                out.extend(all.iter().cloned());
            }
        }
        out
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        let mut counts: Vec<(&String, usize)> =
            handlers.iter().map(|(k, v)| (k, v.len())).collect();
        counts.sort();
        f.debug_struct("EventRegistry").field("handlers", &counts).finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use serde_json::json;

    use tollgate_contracts::{
        error::GateError,
        event::{event_types, Event},
    };

    use super::EventRegistry;

    /// A closure that appends `tag` to a shared log.
    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        tag: &'static str,
    ) -> impl Fn(&Event) -> Result<(), String> + Send + Sync + 'static {
        let log = Arc::clone(log);
        move |_event: &Event| {
            log.lock().unwrap().push(tag.to_string());
            Ok(())
        }
    }

    #[test]
    fn no_subscribers_means_no_dispatch_work() {
        let registry = EventRegistry::new();
        assert!(!registry.has_subscribers(event_types::TOOL_CALL_APPROVED));
        registry.dispatch(event_types::TOOL_CALL_APPROVED, json!({})).unwrap();
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let registry = EventRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        registry.subscribe_fn("tool_call.approved", recorder(&log, "first"));
        registry.subscribe_fn("tool_call.approved", recorder(&log, "second"));
        registry.subscribe_fn("tool_call.approved", recorder(&log, "third"));

        registry.dispatch("tool_call.approved", json!({ "id": "c1" })).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn handlers_only_receive_their_type() {
        let registry = EventRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        registry.subscribe_fn("tool_call.approved", recorder(&log, "approved"));
        registry.subscribe_fn("tool_call.rejected", recorder(&log, "rejected"));

        registry.dispatch("tool_call.rejected", json!({})).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["rejected"]);
    }

    /// A failing handler does not stop later handlers; the failure is
    /// reported once every handler has run.
    #[test]
    fn failing_handler_is_collected_not_fail_fast() {
        let registry = EventRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        registry.subscribe_fn("run.resumed", recorder(&log, "before"));
        registry.subscribe_fn("run.resumed", |_e: &Event| Err("observer down".to_string()));
        registry.subscribe_fn("run.resumed", recorder(&log, "after"));
        registry.subscribe_fn("run.resumed", |_e: &Event| Err("second observer down".to_string()));

        let result = registry.dispatch("run.resumed", json!({}));

        assert_eq!(*log.lock().unwrap(), vec!["before", "after"]);
        match result {
            Err(GateError::HandlerFailed { event_type, failures }) => {
                assert_eq!(event_type, "run.resumed");
                assert_eq!(failures, vec!["observer down", "second observer down"]);
            }
            other => panic!("expected HandlerFailed, got {:?}", other),
        }
    }

    #[test]
    fn emit_skips_building_without_subscribers() {
        let registry = EventRegistry::new();
        let built = AtomicUsize::new(0);

        registry
            .emit(event_types::TEXT_CHUNK, || {
                built.fetch_add(1, Ordering::SeqCst);
                json!({ "text": "hello" })
            })
            .unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 0, "payload must not be built");

        registry.subscribe_fn(event_types::TEXT_CHUNK, |_e: &Event| Ok(()));
        registry
            .emit(event_types::TEXT_CHUNK, || {
                built.fetch_add(1, Ordering::SeqCst);
                json!({ "text": "hello" })
            })
            .unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wildcard_receives_everything_after_specific_handlers() {
        let registry = EventRegistry::new();
        let log = Arc::new(Mutex::new(vec![]));
        registry.subscribe_fn(event_types::WILDCARD, recorder(&log, "wildcard"));
        registry.subscribe_fn("tool_call.created", recorder(&log, "specific"));

        assert!(registry.has_subscribers("anything.at.all"));
        assert_eq!(registry.subscriber_count("tool_call.created"), 2);

        registry.dispatch("tool_call.created", json!({})).unwrap();
        registry.dispatch("run.completed", json!({})).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["specific", "wildcard", "wildcard"]);
    }

    #[test]
    fn handler_sees_event_data() {
        let registry = EventRegistry::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        registry.subscribe_fn("tool_call.completed", move |e: &Event| {
            *sink.lock().unwrap() = Some(e.data.clone());
            Ok(())
        });

        registry
            .dispatch("tool_call.completed", json!({ "tool_call_id": "c7", "result": "ok" }))
            .unwrap();

        let data = seen.lock().unwrap().clone().unwrap();
        assert_eq!(data["tool_call_id"], "c7");
    }

    #[test]
    fn handler_may_subscribe_during_dispatch() {
        let registry = Arc::new(EventRegistry::new());
        let inner = Arc::clone(&registry);
        registry.subscribe_fn("run.suspended", move |_e: &Event| {
            inner.subscribe_fn("run.completed", |_e: &Event| Ok(()));
            Ok(())
        });

        registry.dispatch("run.suspended", json!({})).unwrap();
        assert!(registry.has_subscribers("run.completed"));
    }
}
