//! State replicated across all units of the application.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use time::OffsetDateTime;

use idop_context::Context;

use crate::InvalidStateValue;
use crate::StateBackend;

/// Peer key recording the time of the last fernet key rotation, as a unix timestamp.
const LAST_FERNET_ROTATION: &str = "last-fernet-rotation";

/// Peer key signalling the leader completed bootstrap.
const LEADER_READY: &str = "leader_ready";

/// State replicated across all units of the application.
#[derive(Clone)]
pub struct PeerState(Arc<dyn StateBackend>);

impl PeerState {
    /// Return all entries in the peer state.
    pub async fn entries(&self, context: &Context) -> Result<BTreeMap<String, String>> {
        self.0.entries(context).await
    }

    /// Lookup the value of a key, if set.
    pub async fn get(&self, context: &Context, key: &str) -> Result<Option<String>> {
        self.0.get(context, key).await
    }

    /// Time of the last fernet key rotation, if one was recorded.
    pub async fn last_fernet_rotation(&self, context: &Context) -> Result<Option<OffsetDateTime>> {
        let value = match self.0.get(context, LAST_FERNET_ROTATION).await? {
            None => return Ok(None),
            Some(value) => value,
        };
        let timestamp: i64 = value
            .trim()
            .parse()
            .map_err(|_| InvalidStateValue::new(LAST_FERNET_ROTATION))?;
        let time = OffsetDateTime::from_unix_timestamp(timestamp)
            .map_err(|_| InvalidStateValue::new(LAST_FERNET_ROTATION))?;
        Ok(Some(time))
    }

    /// Check if the leader signalled the identity service is bootstrapped.
    pub async fn leader_ready(&self, context: &Context) -> Result<bool> {
        let value = self.0.get(context, LEADER_READY).await?;
        Ok(matches!(value.as_deref(), Some("true")))
    }

    /// Record the time of the latest fernet key rotation.
    pub async fn set_last_fernet_rotation(
        &self,
        context: &Context,
        time: OffsetDateTime,
    ) -> Result<()> {
        let value = time.unix_timestamp().to_string();
        self.0.set(context, LAST_FERNET_ROTATION, value).await
    }

    /// Signal other units that the identity service is bootstrapped.
    pub async fn set_leader_ready(&self, context: &Context) -> Result<()> {
        self.0.set(context, LEADER_READY, "true".into()).await
    }

    /// Set the value of a key, replacing any previous value.
    pub async fn set(&self, context: &Context, key: &str, value: String) -> Result<()> {
        self.0.set(context, key, value).await
    }
}

impl<T> From<T> for PeerState
where
    T: StateBackend + 'static,
{
    fn from(value: T) -> Self {
        PeerState(Arc::new(value))
    }
}
