//! Administrative actions restricted to the leader unit.
use anyhow::Result;
use clap::Args;
use clap::Subcommand;

use crate::init::Globals;

/// Run an administrative action and print its result.
#[derive(Debug, Args)]
pub struct ActionCli {
    #[command(subcommand)]
    pub action: Action,
}

/// Select the administrative action to run.
#[derive(Debug, Subcommand)]
pub enum Action {
    /// Print the credentials of the cloud administrator.
    GetAdminAccount,

    /// Print the credentials of a service account, creating it if needed.
    GetServiceAccount {
        /// Name of the service account.
        #[arg(long)]
        username: String,
    },
}

/// Run the selected action and print its result as JSON.
pub async fn run(globals: &Globals, cli: &ActionCli) -> Result<i32> {
    let context = &globals.context;
    let output = match &cli.action {
        Action::GetAdminAccount => {
            let account = globals.engine.get_admin_account(context).await?;
            serde_json::to_string_pretty(&account)?
        }
        Action::GetServiceAccount { username } => {
            let account = globals
                .engine
                .get_service_account(context, username)
                .await?;
            serde_json::to_string_pretty(&account)?
        }
    };
    println!("{}", output);
    Ok(0)
}
