//! Telemetry related to heartbeats.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::Counter;
use prometheus::Opts;

/// Number of heartbeats fired.
pub static BEAT_COUNT: Lazy<Counter> = Lazy::new(|| {
    Counter::with_opts(Opts::new("idop_heartbeat_count", "Number of heartbeats fired"))
        .expect("failed to initialise BEAT_COUNT counter")
});

/// Number of heartbeats whose callback failed.
pub static BEAT_ERR: Lazy<Counter> = Lazy::new(|| {
    Counter::with_opts(Opts::new(
        "idop_heartbeat_error",
        "Number of heartbeats whose callback failed",
    ))
    .expect("failed to initialise BEAT_ERR counter")
});

/// Number of heartbeats still running when the shutdown grace expired.
pub static BEAT_ABANDONED: Lazy<Counter> = Lazy::new(|| {
    Counter::with_opts(Opts::new(
        "idop_heartbeat_abandoned",
        "Number of heartbeats still running when the shutdown grace expired",
    ))
    .expect("failed to initialise BEAT_ABANDONED counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the heartbeat metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 3] = [
        Box::new(BEAT_COUNT.clone()),
        Box::new(BEAT_ERR.clone()),
        Box::new(BEAT_ABANDONED.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
