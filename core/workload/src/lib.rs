//! Access the identity service workload container.
use std::sync::Arc;

use anyhow::Result;

use idop_context::Context;

mod local;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;

pub use self::local::LocalWorkload;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::WorkloadFixture;

/// A command executed in the workload exited with an error.
///
/// The command is described by its [`summary`].
#[derive(Debug, thiserror::Error)]
#[error("command '{command}' exited with code {code:?}: {stderr}")]
pub struct ExecFailed {
    pub code: Option<i32>,
    pub command: String,
    pub stderr: String,
}

/// Output of a successful command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stderr: String,
    pub stdout: String,
}

/// Access the identity service workload container.
#[derive(Clone)]
pub struct Workload(Arc<dyn WorkloadBackend>);

impl Workload {
    /// Run a command in the workload.
    ///
    /// Commands exiting with a non-zero code fail with [`ExecFailed`].
    /// Only the program and its first argument are logged as commands may carry secrets.
    pub async fn exec(&self, context: &Context, command: &[&str]) -> Result<ExecOutput> {
        slog::debug!(context.logger, "Running workload command"; "command" => summary(command));
        self.0.exec(context, command).await
    }

    /// Write a file into the workload, replacing existing content.
    pub async fn push_file(&self, context: &Context, path: &str, content: &str) -> Result<()> {
        self.0.push_file(context, path, content).await?;
        slog::debug!(context.logger, "Pushed file to workload"; "path" => path);
        Ok(())
    }

    /// Check if the workload is ready to accept commands.
    pub async fn ready(&self, context: &Context) -> Result<bool> {
        self.0.ready(context).await
    }
}

impl<T> From<T> for Workload
where
    T: WorkloadBackend + 'static,
{
    fn from(value: T) -> Self {
        Workload(Arc::new(value))
    }
}

/// Describe a command by its program and first argument, leaving out values that may be secret.
pub fn summary(command: &[&str]) -> String {
    command.iter().take(2).copied().collect::<Vec<_>>().join(" ")
}

/// Operations implemented by workload container providers.
#[async_trait::async_trait]
pub trait WorkloadBackend: Send + Sync {
    /// Run a command in the workload.
    async fn exec(&self, context: &Context, command: &[&str]) -> Result<ExecOutput>;

    /// Write a file into the workload, replacing existing content.
    async fn push_file(&self, context: &Context, path: &str, content: &str) -> Result<()>;

    /// Check if the workload is ready to accept commands.
    async fn ready(&self, context: &Context) -> Result<bool>;
}
