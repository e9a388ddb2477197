//! Workload running on the same host as the operator process.
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context as AnyContext;
use anyhow::Result;

use idop_context::Context;

use crate::ExecFailed;
use crate::ExecOutput;
use crate::WorkloadBackend;

/// Workload sharing the host with the operator process.
///
/// Files are written under a root directory mapped to the workload filesystem
/// and commands are run as child processes.
#[derive(Clone, Debug)]
pub struct LocalWorkload {
    ready_marker: PathBuf,
    root: PathBuf,
}

impl LocalWorkload {
    /// Access a workload with the filesystem at `root`.
    ///
    /// The workload is ready once the `ready_marker` file, relative to `root`, exists.
    pub fn new<P: Into<PathBuf>>(root: P, ready_marker: &str) -> LocalWorkload {
        let root = root.into();
        let ready_marker = resolve(&root, ready_marker);
        LocalWorkload { ready_marker, root }
    }
}

/// Map a workload absolute path onto the local root.
fn resolve(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}

#[async_trait::async_trait]
impl WorkloadBackend for LocalWorkload {
    async fn exec(&self, _: &Context, command: &[&str]) -> Result<ExecOutput> {
        let (program, args) = match command.split_first() {
            Some(parts) => parts,
            None => anyhow::bail!("cannot run an empty command"),
        };
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("unable to run '{}'", program))?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            anyhow::bail!(ExecFailed {
                code: output.status.code(),
                command: crate::summary(command),
                stderr,
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        Ok(ExecOutput { stderr, stdout })
    }

    async fn push_file(&self, _: &Context, path: &str, content: &str) -> Result<()> {
        let target = resolve(&self.root, path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content)
            .await
            .with_context(|| format!("unable to write {}", target.display()))?;
        Ok(())
    }

    async fn ready(&self, _: &Context) -> Result<bool> {
        let ready = tokio::fs::try_exists(&self.ready_marker).await?;
        Ok(ready)
    }
}

#[cfg(test)]
mod tests {
    use idop_context::Context;

    use super::LocalWorkload;
    use crate::ExecFailed;
    use crate::WorkloadBackend;

    #[tokio::test]
    async fn ready_marker() {
        let root = tempfile::tempdir().unwrap();
        let workload = LocalWorkload::new(root.path(), "/run/keystone/ready");
        let context = Context::fixture();
        assert!(!workload.ready(&context).await.unwrap());
        workload
            .push_file(&context, "/run/keystone/ready", "")
            .await
            .unwrap();
        assert!(workload.ready(&context).await.unwrap());
    }

    #[tokio::test]
    async fn push_file_under_root() {
        let root = tempfile::tempdir().unwrap();
        let workload = LocalWorkload::new(root.path(), "/ready");
        workload
            .push_file(&Context::fixture(), "/etc/keystone/keystone.conf", "[DEFAULT]\n")
            .await
            .unwrap();
        let content = std::fs::read_to_string(root.path().join("etc/keystone/keystone.conf")).unwrap();
        assert_eq!(content, "[DEFAULT]\n");
    }

    #[tokio::test]
    async fn exec_success() {
        let root = tempfile::tempdir().unwrap();
        let workload = LocalWorkload::new(root.path(), "/ready");
        let output = workload
            .exec(&Context::fixture(), &["echo", "db_sync"])
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "db_sync");
    }

    #[tokio::test]
    async fn exec_failure() {
        let root = tempfile::tempdir().unwrap();
        let workload = LocalWorkload::new(root.path(), "/ready");
        match workload.exec(&Context::fixture(), &["false"]).await {
            Err(error) if error.is::<ExecFailed>() => (),
            Err(error) => panic!("unexpected error: {:?}", error),
            Ok(_) => panic!("failing command succeeded"),
        }
    }
}
