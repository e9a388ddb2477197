//! State backend storing all entries in a JSON document on the local filesystem.
use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context as AnyContext;
use anyhow::Result;
use tokio::sync::Mutex;

use idop_context::Context;

use crate::StateBackend;

/// State backend storing all entries in a JSON document on the local filesystem.
///
/// The document is rewritten in full on every change, through a temporary file
/// moved in place once written.
pub struct JsonFileState {
    lock: Mutex<()>,
    path: PathBuf,
}

impl JsonFileState {
    /// Store state in the JSON document at the given path.
    pub fn new<P: Into<PathBuf>>(path: P) -> JsonFileState {
        JsonFileState {
            lock: Mutex::new(()),
            path: path.into(),
        }
    }

    async fn read(&self) -> Result<BTreeMap<String, String>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("unable to read state from {}", self.path.display()))?;
        let entries = serde_json::from_slice(&data)
            .with_context(|| format!("unable to decode state from {}", self.path.display()))?;
        Ok(entries)
    }

    async fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(entries)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, data).await?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .with_context(|| format!("unable to write state to {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateBackend for JsonFileState {
    async fn entries(&self, _: &Context) -> Result<BTreeMap<String, String>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn get(&self, _: &Context, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, context: &Context, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        entries.insert(key.to_string(), value);
        self.write(&entries).await?;
        slog::trace!(
            context.logger, "Persisted state entry";
            "key" => key,
            "path" => %self.path.display(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use idop_context::Context;

    use super::JsonFileState;
    use crate::StateBackend;

    #[tokio::test]
    async fn missing_file_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let state = JsonFileState::new(root.path().join("peer.json"));
        let entries = state.entries(&Context::fixture()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn set_survives_reopen() {
        let context = Context::fixture();
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("nested/peer.json");
        let state = JsonFileState::new(&path);
        state
            .set(&context, "password_admin", "secret".into())
            .await
            .unwrap();
        state.set(&context, "leader_ready", "true".into()).await.unwrap();

        let state = JsonFileState::new(&path);
        let value = state.get(&context, "password_admin").await.unwrap();
        assert_eq!(value.as_deref(), Some("secret"));
        assert_eq!(state.entries(&context).await.unwrap().len(), 2);
        assert!(!root.path().join("nested/peer.json.tmp").exists());
    }
}
