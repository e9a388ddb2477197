//! Store the key ring as a directory of files named after the key index.
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context as AnyContext;
use anyhow::Result;

use idop_context::Context;

use crate::FernetKey;
use crate::KeyRing;

/// Key ring repository backed by a directory of numbered files.
///
/// This is the layout the identity service reads keys from.
#[derive(Clone, Debug)]
pub struct DirectoryKeys {
    path: PathBuf,
}

impl DirectoryKeys {
    /// Manage the key ring stored in the given directory.
    pub fn new<P: Into<PathBuf>>(path: P) -> DirectoryKeys {
        DirectoryKeys { path: path.into() }
    }

    /// Read the key ring from the directory.
    ///
    /// A missing directory is an empty ring.
    /// Files with a non-numeric name are ignored.
    pub async fn read(&self, context: &Context) -> Result<KeyRing> {
        let mut ring = KeyRing::default();
        if !tokio::fs::try_exists(&self.path).await? {
            slog::debug!(
                context.logger, "Fernet keys directory does not exist";
                "path" => %self.path.display(),
            );
            return Ok(ring);
        }

        for index in self.indexes().await? {
            let path = self.path.join(index.to_string());
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("unable to read fernet key at {}", path.display()))?;
            ring.insert(index, FernetKey::parse(index, &text)?);
        }
        Ok(ring)
    }

    /// Replace the key ring in the directory.
    ///
    /// Keys are written to a temporary file and moved in place so readers never see
    /// partial keys. Numbered files not in the ring are removed afterwards.
    pub async fn write(&self, context: &Context, ring: &KeyRing) -> Result<()> {
        tokio::fs::create_dir_all(&self.path)
            .await
            .with_context(|| format!("unable to create {}", self.path.display()))?;

        for (index, key) in ring.iter() {
            let target = self.path.join(index.to_string());
            let staging = self.path.join(format!(".{}.tmp", index));
            tokio::fs::write(&staging, key.expose()).await?;
            restrict_permissions(&staging).await?;
            tokio::fs::rename(&staging, &target)
                .await
                .with_context(|| format!("unable to write fernet key {}", target.display()))?;
        }

        for index in self.indexes().await? {
            if ring.get(index).is_none() {
                let path = self.path.join(index.to_string());
                tokio::fs::remove_file(&path).await?;
                slog::debug!(context.logger, "Removed retired fernet key"; "index" => index);
            }
        }
        slog::debug!(
            context.logger, "Fernet key ring written";
            "keys" => ring.len(),
            "path" => %self.path.display(),
        );
        Ok(())
    }

    /// List indexes of the keys currently in the directory.
    async fn indexes(&self) -> Result<Vec<u32>> {
        let mut indexes = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(index) = name.to_str().and_then(|name| name.parse::<u32>().ok()) {
                indexes.push(index);
            }
        }
        indexes.sort_unstable();
        Ok(indexes)
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = std::fs::Permissions::from_mode(0o600);
    tokio::fs::set_permissions(path, permissions).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use idop_context::Context;

    use super::DirectoryKeys;
    use crate::FernetKey;
    use crate::InvalidKey;
    use crate::KeyRing;

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let root = tempfile::tempdir().unwrap();
        let keys = DirectoryKeys::new(root.path().join("fernet-keys"));
        let ring = keys.read(&Context::fixture()).await.unwrap();
        assert!(ring.is_empty());
    }

    #[tokio::test]
    async fn write_then_read() {
        let context = Context::fixture();
        let root = tempfile::tempdir().unwrap();
        let keys = DirectoryKeys::new(root.path().join("fernet-keys"));
        let ring = KeyRing::initial();
        keys.write(&context, &ring).await.unwrap();
        assert!(root.path().join("fernet-keys/0").exists());
        assert!(root.path().join("fernet-keys/1").exists());
        assert_eq!(keys.read(&context).await.unwrap(), ring);
    }

    #[tokio::test]
    async fn write_removes_retired_keys() {
        let context = Context::fixture();
        let root = tempfile::tempdir().unwrap();
        let keys = DirectoryKeys::new(root.path());
        let mut ring = KeyRing::initial();
        ring.rotate(3).unwrap();
        keys.write(&context, &ring).await.unwrap();
        ring.rotate(3).unwrap();
        keys.write(&context, &ring).await.unwrap();

        assert!(!root.path().join("1").exists());
        let stored = keys.read(&context).await.unwrap();
        let indexes: Vec<u32> = stored.iter().map(|(index, _)| index).collect();
        assert_eq!(indexes, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn read_ignores_other_files() {
        let context = Context::fixture();
        let root = tempfile::tempdir().unwrap();
        let key = FernetKey::generate();
        std::fs::write(root.path().join("README"), "not a key").unwrap();
        std::fs::write(root.path().join("4"), key.expose()).unwrap();
        let ring = DirectoryKeys::new(root.path()).read(&context).await.unwrap();
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.get(4), Some(&key));
    }

    #[tokio::test]
    async fn read_rejects_corrupt_keys() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("0"), "garbage!").unwrap();
        let keys = DirectoryKeys::new(root.path());
        match keys.read(&Context::fixture()).await {
            Err(error) if error.is::<InvalidKey>() => (),
            Err(error) => panic!("unexpected error: {:?}", error),
            Ok(_) => panic!("corrupt key was accepted"),
        }
    }
}
