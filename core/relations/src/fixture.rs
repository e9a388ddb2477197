//! In-memory relation exchange for unit tests.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use idop_context::Context;

use crate::RelationData;
use crate::RelationRef;
use crate::RelationsBackend;

/// In-memory relation exchange for unit tests.
#[derive(Clone, Default)]
pub struct RelationsFixture {
    inner: Arc<Mutex<RelationsFixtureState>>,
}

impl RelationsFixture {
    /// Lock and access the shared inner state.
    fn access(&self) -> MutexGuard<RelationsFixtureState> {
        self.inner
            .lock()
            .expect("RelationsFixture::inner state lock poisoned")
    }

    /// Establish a relation with the given remote data.
    pub fn add(&self, relation: RelationRef, data: RelationData) {
        self.access().remote.insert(relation, data);
    }

    /// Number of times data was published on the relation.
    pub fn publish_count(&self, relation: &RelationRef) -> usize {
        self.access()
            .published
            .get(relation)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Latest data published on the relation, if any.
    pub fn published(&self, relation: &RelationRef) -> Option<RelationData> {
        self.access()
            .published
            .get(relation)
            .and_then(|history| history.last().cloned())
    }
}

#[async_trait::async_trait]
impl RelationsBackend for RelationsFixture {
    async fn list(&self, _: &Context, name: &str) -> Result<Vec<RelationRef>> {
        let relations = self
            .access()
            .remote
            .keys()
            .filter(|relation| relation.name == name)
            .cloned()
            .collect();
        Ok(relations)
    }

    async fn publish(&self, _: &Context, relation: &RelationRef, data: RelationData) -> Result<()> {
        self.access()
            .published
            .entry(relation.clone())
            .or_default()
            .push(data);
        Ok(())
    }

    async fn remote_data(&self, _: &Context, relation: &RelationRef) -> Result<RelationData> {
        let data = self
            .access()
            .remote
            .get(relation)
            .cloned()
            .unwrap_or_default();
        Ok(data)
    }
}

/// Container for the shared state.
#[derive(Default)]
struct RelationsFixtureState {
    published: BTreeMap<RelationRef, Vec<RelationData>>,
    remote: BTreeMap<RelationRef, RelationData>,
}
