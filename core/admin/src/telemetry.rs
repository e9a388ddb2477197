//! Telemetry related to identity administration.
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::CounterVec;
use prometheus::Opts;

/// Number of identity objects created on the remote service, by kind.
pub static CREATE_COUNT: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "idop_admin_create_count",
            "Number of identity objects created on the remote service",
        ),
        &["kind"],
    )
    .expect("failed to initialise CREATE_COUNT counter")
});

/// Number of identity API operations that resulted in error.
pub static OPERATION_ERR: Lazy<CounterVec> = Lazy::new(|| {
    CounterVec::new(
        Opts::new(
            "idop_admin_operation_error",
            "Number of identity API operations that resulted in error",
        ),
        &["operation"],
    )
    .expect("failed to initialise OPERATION_ERR counter")
});

/// Ensure metrics are registered only once.
static METRICS_REGISTERED: AtomicBool = AtomicBool::new(false);

/// The first time this method is called it will register the identity administration metrics.
pub fn register_metrics(reg: &prometheus::Registry) -> Result<()> {
    if METRICS_REGISTERED.swap(true, Ordering::AcqRel) {
        return Ok(());
    }

    let collectors: [Box<dyn prometheus::core::Collector>; 2] = [
        Box::new(CREATE_COUNT.clone()),
        Box::new(OPERATION_ERR.clone()),
    ];
    for collector in collectors {
        reg.register(collector)?;
    }
    Ok(())
}
