//! Run identity operator commands against the identity service of a unit.
use anyhow::Context as AnyContext;
use anyhow::Result;
use clap::Parser;

mod cmd;
mod init;
mod logging;

pub use self::cmd::Cli;

/// Exit code for events the host must deliver again later.
pub const EXIT_DEFER: i32 = 75;

/// Initialise the process and invoke the selected command.
///
/// Returns the exit code for the process.
pub async fn execute(cli: Cli) -> Result<i32> {
    let conf = idop_conf::load(&cli.config)?;
    let logger = logging::configure(&cli.log)?;
    let globals = init::Globals::initialise(&cli, conf, logger)?;

    let code = match &cli.command {
        cmd::Command::Action(action) => cmd::action::run(&globals, action).await,
        cmd::Command::Dispatch(dispatch) => cmd::dispatch::run(&globals, dispatch).await,
        cmd::Command::Heartbeat => cmd::heartbeat::run(&globals).await,
    };
    globals.dump_metrics()?;
    code
}

/// Initialise the async runtime for the process and invoke [`execute`].
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed tokio runtime initialisation")?
        .block_on(execute(cli))
}
