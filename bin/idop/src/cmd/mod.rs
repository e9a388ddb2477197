//! CLI interface for the identity operator.
use clap::Parser;
use clap::Subcommand;

pub mod action;
pub mod dispatch;
pub mod heartbeat;

use crate::logging::LogOpt;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " [",
    env!("GIT_BUILD_HASH"),
    "; ",
    env!("GIT_BUILD_TAINT"),
    "]",
);

/// Identity operator reconciling identity service state with the deployment.
#[derive(Debug, Parser)]
#[command(about)]
#[command(propagate_version = true)]
#[command(version = VERSION)]
pub struct Cli {
    /// Path to the operator configuration to use.
    #[arg(
        short = 'c', long = "config", global = true, env = "IDOP_CONFIG",
        default_value_t = String::from("idop.yaml"),
    )]
    pub config: String,

    /// The unit runs as the leader of the application.
    #[arg(long = "leader", global = true, env = "IDOP_LEADER")]
    pub leader: bool,

    /// Configure how the operator logs.
    #[command(flatten)]
    pub log: LogOpt,

    /// Select the operator command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Select the operator command to run.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run an administrative action and print its result.
    Action(action::ActionCli),

    /// Handle one event and exit with the outcome.
    ///
    /// Exits with code 75 when the event must be delivered again later.
    Dispatch(dispatch::DispatchCli),

    /// Periodically rotate fernet keys until the process is stopped.
    Heartbeat,
}
