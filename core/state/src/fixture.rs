//! In-memory implementation of a [`StateBackend`] for unit tests.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use idop_context::Context;

use crate::StateBackend;

/// In-memory implementation of a [`StateBackend`] for unit tests.
#[derive(Clone, Default)]
pub struct StateFixture {
    inner: Arc<Mutex<BTreeMap<String, String>>>,
}

impl StateFixture {
    /// Lock and access the shared inner state.
    fn access(&self) -> MutexGuard<BTreeMap<String, String>> {
        self.inner
            .lock()
            .expect("StateFixture::inner state lock poisoned")
    }
}

#[async_trait::async_trait]
impl StateBackend for StateFixture {
    async fn entries(&self, _: &Context) -> Result<BTreeMap<String, String>> {
        Ok(self.access().clone())
    }

    async fn get(&self, _: &Context, key: &str) -> Result<Option<String>> {
        Ok(self.access().get(key).cloned())
    }

    async fn set(&self, _: &Context, key: &str, value: String) -> Result<()> {
        self.access().insert(key.to_string(), value);
        Ok(())
    }
}
