//! Relation exchange backed by JSON documents on the local filesystem.
//!
//! Each relation is stored at `<root>/<endpoint>/<id>.json` as a document with the
//! remote application name, the data it published and the data published to it.
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context as AnyContext;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use idop_context::Context;

use crate::RelationData;
use crate::RelationRef;
use crate::RelationsBackend;

/// Relation exchange backed by JSON documents on the local filesystem.
#[derive(Clone, Debug)]
pub struct DirectoryRelations {
    root: PathBuf,
}

impl DirectoryRelations {
    /// Exchange relation data through documents in the given directory.
    pub fn new<P: Into<PathBuf>>(root: P) -> DirectoryRelations {
        DirectoryRelations { root: root.into() }
    }

    fn path(&self, relation: &RelationRef) -> PathBuf {
        self.root
            .join(&relation.name)
            .join(format!("{}.json", relation.id))
    }

    async fn read(&self, path: &Path) -> Result<RelationDocument> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("unable to read relation at {}", path.display()))?;
        let document = serde_json::from_slice(&data)
            .with_context(|| format!("unable to decode relation at {}", path.display()))?;
        Ok(document)
    }
}

#[async_trait::async_trait]
impl RelationsBackend for DirectoryRelations {
    async fn list(&self, _: &Context, name: &str) -> Result<Vec<RelationRef>> {
        let endpoint = self.root.join(name);
        if !tokio::fs::try_exists(&endpoint).await? {
            return Ok(Vec::new());
        }

        let mut relations = Vec::new();
        let mut entries = tokio::fs::read_dir(&endpoint).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let id = path
                .extension()
                .filter(|extension| *extension == "json")
                .and_then(|_| path.file_stem())
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<u32>().ok());
            let id = match id {
                None => continue,
                Some(id) => id,
            };
            let document = self.read(&path).await?;
            relations.push(RelationRef {
                app: document.app,
                id,
                name: name.to_string(),
            });
        }
        relations.sort();
        Ok(relations)
    }

    async fn publish(
        &self,
        context: &Context,
        relation: &RelationRef,
        data: RelationData,
    ) -> Result<()> {
        let path = self.path(relation);
        let mut document = self.read(&path).await?;
        document.local = data;
        let encoded = serde_json::to_vec_pretty(&document)?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, encoded).await?;
        tokio::fs::rename(&staging, &path)
            .await
            .with_context(|| format!("unable to write relation at {}", path.display()))?;
        slog::trace!(
            context.logger, "Relation document updated";
            "path" => %path.display(),
        );
        Ok(())
    }

    async fn remote_data(&self, _: &Context, relation: &RelationRef) -> Result<RelationData> {
        let document = self.read(&self.path(relation)).await?;
        Ok(document.remote)
    }
}

/// On disk representation of a relation.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RelationDocument {
    app: String,

    #[serde(default)]
    local: RelationData,

    #[serde(default)]
    remote: RelationData,
}
