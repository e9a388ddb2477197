//! Workload fixture recording operations for unit tests.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use idop_context::Context;

use crate::ExecFailed;
use crate::ExecOutput;
use crate::WorkloadBackend;

/// Workload fixture recording operations for unit tests.
#[derive(Clone)]
pub struct WorkloadFixture {
    inner: Arc<Mutex<WorkloadFixtureState>>,
}

impl Default for WorkloadFixture {
    fn default() -> Self {
        let state = WorkloadFixtureState {
            commands: Vec::new(),
            failing: Vec::new(),
            files: BTreeMap::new(),
            ready: true,
        };
        WorkloadFixture {
            inner: Arc::new(Mutex::new(state)),
        }
    }
}

impl WorkloadFixture {
    /// Lock and access the shared inner state.
    fn access(&self) -> MutexGuard<WorkloadFixtureState> {
        self.inner
            .lock()
            .expect("WorkloadFixture::inner state lock poisoned")
    }

    /// Commands executed so far, joined by spaces.
    pub fn commands(&self) -> Vec<String> {
        self.access().commands.clone()
    }

    /// Fail commands that contain the given argument.
    pub fn fail_commands_with(&self, argument: &str) {
        self.access().failing.push(argument.to_string());
    }

    /// Content of a file pushed to the workload.
    pub fn file(&self, path: &str) -> Option<String> {
        self.access().files.get(path).cloned()
    }

    /// Stop failing commands.
    pub fn heal(&self) {
        self.access().failing.clear();
    }

    /// Set the workload readiness.
    pub fn set_ready(&self, ready: bool) {
        self.access().ready = ready;
    }
}

#[async_trait::async_trait]
impl WorkloadBackend for WorkloadFixture {
    async fn exec(&self, _: &Context, command: &[&str]) -> Result<ExecOutput> {
        let mut state = self.access();
        state.commands.push(command.join(" "));
        let fail = state
            .failing
            .iter()
            .any(|argument| command.contains(&argument.as_str()));
        if fail {
            anyhow::bail!(ExecFailed {
                code: Some(1),
                command: crate::summary(command),
                stderr: "injected failure".into(),
            });
        }
        Ok(ExecOutput::default())
    }

    async fn push_file(&self, _: &Context, path: &str, content: &str) -> Result<()> {
        self.access()
            .files
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn ready(&self, _: &Context) -> Result<bool> {
        Ok(self.access().ready)
    }
}

/// Container for the shared state.
struct WorkloadFixtureState {
    commands: Vec<String>,
    failing: Vec<String>,
    files: BTreeMap<String, String>,
    ready: bool,
}
