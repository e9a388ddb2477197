//! Persisted state for the identity operator.
//!
//! State is kept in two scopes:
//!
//! - [`PeerState`] is replicated to all units of the application and written by the leader.
//! - [`LocalState`] is private to the unit the operator process manages.
//!
//! Both scopes are string key/value maps provided by a [`StateBackend`].
use std::collections::BTreeMap;

use anyhow::Result;

use idop_context::Context;

mod file;
mod local;
mod peer;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;

pub use self::file::JsonFileState;
pub use self::local::LocalState;
pub use self::local::UnitState;
pub use self::local::UnitStatus;
pub use self::peer::PeerState;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::StateFixture;

/// The value stored for a state key could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("the value stored for state key '{key}' could not be decoded")]
pub struct InvalidStateValue {
    pub key: String,
}

impl InvalidStateValue {
    /// The value stored for the given key could not be decoded.
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self { key: key.into() }
    }
}

/// Operations implemented by persisted key/value state providers.
#[async_trait::async_trait]
pub trait StateBackend: Send + Sync {
    /// Return all entries in the state.
    async fn entries(&self, context: &Context) -> Result<BTreeMap<String, String>>;

    /// Lookup the value of a key, if set.
    async fn get(&self, context: &Context, key: &str) -> Result<Option<String>>;

    /// Set the value of a key, replacing any previous value.
    async fn set(&self, context: &Context, key: &str, value: String) -> Result<()>;
}
