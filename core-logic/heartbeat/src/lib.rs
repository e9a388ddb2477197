//! Periodically invoke a callback until the process exits.
//!
//! The heartbeat drives time based reconciliation such as fernet key rotation.
//! The callback decides if any work is due: firing more often than needed is harmless
//! but firing less often than the work requires is not, so the interval is clamped.
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tokio::time::MissedTickBehavior;

use idop_context::Context;

mod telemetry;

#[cfg(test)]
mod tests;

pub use self::telemetry::register_metrics;

/// Shortest interval between heartbeats.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Time an in-flight heartbeat is given to complete once exit is requested.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Async callback invoked on every heartbeat.
#[async_trait::async_trait]
pub trait HeartbeatCallback: Send + Sync {
    /// Perform any time based work that is due.
    async fn beat(&self, context: &Context) -> Result<()>;
}

/// Invoke a [`HeartbeatCallback`] on a fixed interval.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heartbeat {
    grace: Duration,
    interval: Duration,
}

impl Heartbeat {
    /// Fire on the requested interval, but never less often than `limit` requires.
    pub fn new(context: &Context, requested: Duration, limit: Duration) -> Heartbeat {
        let mut interval = requested;
        if interval > limit {
            slog::warn!(
                context.logger, "Heartbeat interval clamped to the rotation interval";
                "requested_sec" => requested.as_secs(),
                "limit_sec" => limit.as_secs(),
            );
            interval = limit;
        }
        Heartbeat {
            grace: DEFAULT_SHUTDOWN_GRACE,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Wait at most `grace` for an in-flight heartbeat when exit is requested.
    pub fn with_grace(mut self, grace: Duration) -> Heartbeat {
        self.grace = grace;
        self
    }

    /// Time an in-flight heartbeat is given to complete on exit.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Time between two heartbeats.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Invoke the callback on every tick until the `exit` future resolves.
    ///
    /// The first heartbeat fires immediately.
    /// Callback errors are logged and do not stop the loop.
    /// A heartbeat in progress when `exit` resolves is given the shutdown grace to complete.
    pub async fn run<C>(&self, context: &Context, callback: &C, exit: impl Future<Output = ()>)
    where
        C: HeartbeatCallback + ?Sized,
    {
        tokio::pin!(exit);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        slog::info!(
            context.logger, "Starting heartbeat";
            "interval_sec" => self.interval.as_secs(),
            "grace_sec" => self.grace.as_secs(),
        );

        loop {
            tokio::select! {
                _ = &mut exit => break,
                _ = ticker.tick() => (),
            }

            let beat = beat(context, callback);
            tokio::pin!(beat);
            tokio::select! {
                _ = &mut beat => continue,
                _ = &mut exit => (),
            }

            slog::info!(
                context.logger, "Waiting for the current heartbeat before stopping";
                "grace_sec" => self.grace.as_secs(),
            );
            if tokio::time::timeout(self.grace, beat).await.is_err() {
                telemetry::BEAT_ABANDONED.inc();
                slog::warn!(
                    context.logger, "Heartbeat abandoned after the shutdown grace expired";
                    "grace_sec" => self.grace.as_secs(),
                );
            }
            break;
        }
        slog::info!(context.logger, "Heartbeat stopped");
    }
}

/// Invoke the callback once, recording the outcome.
async fn beat<C>(context: &Context, callback: &C)
where
    C: HeartbeatCallback + ?Sized,
{
    telemetry::BEAT_COUNT.inc();
    if let Err(error) = callback.beat(context).await {
        telemetry::BEAT_ERR.inc();
        slog::error!(
            context.logger, "Heartbeat callback failed";
            "error" => format!("{:#}", error),
        );
    }
}
