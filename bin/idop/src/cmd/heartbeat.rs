//! Periodically trigger time based reconciliation.
use std::time::Duration;

use anyhow::Result;

use idop_heartbeat::Heartbeat;

use crate::init::Globals;

/// Run the heartbeat until the process receives an interrupt signal.
pub async fn run(globals: &Globals) -> Result<i32> {
    let context = &globals.context;
    let requested = Duration::from_secs(globals.conf.runtime.heartbeat_interval_sec);
    let limit = globals.engine.rotation_policy().interval();
    let grace = Duration::from_secs(globals.conf.runtime.shutdown_grace_sec);
    let heartbeat = Heartbeat::new(context, requested, limit).with_grace(grace);

    let exit = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            slog::error!(
                context.logger, "Unable to listen for interrupt signal";
                "error" => format!("{:#}", error),
            );
        }
    };
    heartbeat.run(context, &globals.engine, exit).await;
    Ok(0)
}
