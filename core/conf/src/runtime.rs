//! Container for the process runtime configuration.
use serde::Deserialize;
use serde::Serialize;

/// Container for the process runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConf {
    /// Interval, in seconds, between heartbeat events when running the scheduler.
    #[serde(default = "RuntimeConf::default_heartbeat_interval")]
    pub heartbeat_interval_sec: u64,

    /// Allowed time, in seconds, for the running heartbeat to complete once shutdown begins.
    #[serde(default = "RuntimeConf::default_shutdown_grace")]
    pub shutdown_grace_sec: u64,
}

impl RuntimeConf {
    fn default_heartbeat_interval() -> u64 {
        300
    }

    fn default_shutdown_grace() -> u64 {
        30
    }
}

impl Default for RuntimeConf {
    fn default() -> Self {
        RuntimeConf {
            heartbeat_interval_sec: Self::default_heartbeat_interval(),
            shutdown_grace_sec: Self::default_shutdown_grace(),
        }
    }
}
