//! Typed data exchanged with applications related to the identity service.
//!
//! Relations carry string key/value maps in both directions:
//! consumers write requests in the remote data and the operator answers by
//! publishing a typed bundle in the local data.
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use idop_context::Context;

mod bundles;
mod directory;
mod requests;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;

pub use self::bundles::CloudCredentialsBundle;
pub use self::bundles::IdentityServiceBundle;
pub use self::bundles::API_VERSION_CREDENTIALS;
pub use self::bundles::API_VERSION_IDENTITY;
pub use self::directory::DirectoryRelations;
pub use self::requests::CredentialsRequest;
pub use self::requests::IdentityServiceRequest;
pub use self::requests::InvalidRequest;
pub use self::requests::ServiceEndpointRequest;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::RelationsFixture;

/// Relation endpoint consumers request catalog registration and service credentials on.
pub const IDENTITY_SERVICE: &str = "identity-service";

/// Relation endpoint consumers request cloud credentials on.
pub const IDENTITY_CREDENTIALS: &str = "identity-credentials";

/// String key/value map exchanged over a relation.
pub type RelationData = BTreeMap<String, String>;

/// Reference to an established relation with another application.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationRef {
    /// Name of the remote application.
    pub app: String,

    /// Unique ID of the relation.
    pub id: u32,

    /// Name of the local relation endpoint.
    pub name: String,
}

impl std::fmt::Display for RelationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.id)
    }
}

/// Access relations established with other applications.
#[derive(Clone)]
pub struct Relations(Arc<dyn RelationsBackend>);

impl Relations {
    /// List relations established on the given local endpoint.
    pub async fn list(&self, context: &Context, name: &str) -> Result<Vec<RelationRef>> {
        self.0.list(context, name).await
    }

    /// Publish data for the remote application to read.
    pub async fn publish(
        &self,
        context: &Context,
        relation: &RelationRef,
        data: RelationData,
    ) -> Result<()> {
        self.0.publish(context, relation, data).await?;
        slog::debug!(context.logger, "Published relation data"; "relation" => %relation);
        Ok(())
    }

    /// Read the data published by the remote application.
    pub async fn remote_data(&self, context: &Context, relation: &RelationRef) -> Result<RelationData> {
        self.0.remote_data(context, relation).await
    }
}

impl<T> From<T> for Relations
where
    T: RelationsBackend + 'static,
{
    fn from(value: T) -> Self {
        Relations(Arc::new(value))
    }
}

/// Operations implemented by relation data exchange providers.
#[async_trait::async_trait]
pub trait RelationsBackend: Send + Sync {
    /// List relations established on the given local endpoint.
    async fn list(&self, context: &Context, name: &str) -> Result<Vec<RelationRef>>;

    /// Publish data for the remote application to read, replacing previous data.
    async fn publish(
        &self,
        context: &Context,
        relation: &RelationRef,
        data: RelationData,
    ) -> Result<()>;

    /// Read the data published by the remote application.
    async fn remote_data(&self, context: &Context, relation: &RelationRef) -> Result<RelationData>;
}
