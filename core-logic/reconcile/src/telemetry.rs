//! Telemetry related to event reconciliation.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Opts;

use crate::DeferReason;
use crate::Event;
use crate::Outcome;

/// Number of events handled, by event kind and outcome.
pub static EVENTS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new("idop_reconcile_events", "Number of events handled"),
        &["event", "outcome"],
    )
    .expect("failed to initialise EVENTS counter")
});

/// Number of events that failed with an error that can't be retried.
pub static EVENT_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "idop_reconcile_event_error",
            "Number of events that failed with an error that can't be retried",
        ),
        &["event"],
    )
    .expect("failed to initialise EVENT_ERR counter")
});

/// Number of relation request state transitions, by target state.
pub static REQUEST_TRANSITIONS: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "idop_reconcile_request_transitions",
            "Number of relation request state transitions",
        ),
        &["state"],
    )
    .expect("failed to initialise REQUEST_TRANSITIONS counter")
});

/// Number of fernet key ring rotations performed.
pub static ROTATIONS: Lazy<Counter> = Lazy::new(|| {
    Counter::with_opts(Opts::new(
        "idop_reconcile_fernet_rotations",
        "Number of fernet key ring rotations performed",
    ))
    .expect("failed to initialise ROTATIONS counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the reconciliation metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
        Box::new(EVENTS.clone()),
        Box::new(EVENT_ERR.clone()),
        Box::new(REQUEST_TRANSITIONS.clone()),
        Box::new(ROTATIONS.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}

/// Count a handled event by its outcome.
pub fn observe(event: &Event, outcome: &Outcome) {
    let outcome = match outcome {
        Outcome::Handled => "handled",
        Outcome::Rejected(_) => "rejected",
        Outcome::DeferRetry(DeferReason::Gate(_)) => "deferred",
        Outcome::DeferRetry(DeferReason::Failure(_)) => "failed",
    };
    EVENTS.with_label_values(&[event.kind(), outcome]).inc();
}
