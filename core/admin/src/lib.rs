//! Idempotent administration of identity service objects.
//!
//! Every `get_or_create_*` operation follows the same contract:
//!
//! - Look the object up by its natural key (name and scope).
//! - If found and `may_exist` is set, return it unchanged.
//! - If found and `may_exist` is not set, fail with [`AlreadyExists`].
//! - If not found, create it with the requested attributes.
//!
//! Redelivered requests therefore never create duplicate objects.
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use idop_context::Context;
use idop_errors::AdminApiError;
use idop_errors::AlreadyExists;
use idop_fernet::KeyRing;

mod models;
mod telemetry;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(test)]
mod tests;

pub use self::models::Domain;
pub use self::models::DomainSpec;
pub use self::models::Endpoint;
pub use self::models::EndpointSpec;
pub use self::models::Interface;
pub use self::models::Project;
pub use self::models::ProjectSpec;
pub use self::models::Role;
pub use self::models::RoleSpec;
pub use self::models::Service;
pub use self::models::ServiceSpec;
pub use self::models::User;
pub use self::models::UserSpec;
pub use self::telemetry::register_metrics;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::AdminFixture;

/// Idempotent administration of identity service objects.
#[derive(Clone)]
pub struct IdentityAdmin(Arc<dyn IdentityAdminBackend>);

impl IdentityAdmin {
    /// Lookup a domain by ID.
    pub async fn domain(&self, context: &Context, id: &str) -> Result<Option<Domain>> {
        remote("get_domain", self.0.domain(context, id)).await
    }

    /// Lookup a domain by name.
    pub async fn find_domain(&self, context: &Context, name: &str) -> Result<Option<Domain>> {
        remote("find_domain", self.0.find_domain(context, name)).await
    }

    /// Lookup a project by name in a domain.
    pub async fn find_project(
        &self,
        context: &Context,
        name: &str,
        domain_id: &str,
    ) -> Result<Option<Project>> {
        remote("find_project", self.0.find_project(context, name, domain_id)).await
    }

    /// Lookup a user by name in a domain.
    pub async fn find_user(
        &self,
        context: &Context,
        name: &str,
        domain_id: &str,
    ) -> Result<Option<User>> {
        remote("find_user", self.0.find_user(context, name, domain_id)).await
    }

    /// Fetch or create a domain.
    pub async fn get_or_create_domain(
        &self,
        context: &Context,
        spec: &DomainSpec,
        may_exist: bool,
    ) -> Result<Domain> {
        let found = self.find_domain(context, &spec.name).await?;
        if let Some(domain) = existing("domain", &spec.name, found, may_exist)? {
            return Ok(domain);
        }
        let domain = remote("create_domain", self.0.create_domain(context, spec)).await?;
        created(context, "domain", &domain.name, &domain.id);
        Ok(domain)
    }

    /// Fetch or create an endpoint for a service on an interface and region.
    ///
    /// Existing endpoints are returned as they are, even if their URL differs.
    pub async fn get_or_create_endpoint(
        &self,
        context: &Context,
        spec: &EndpointSpec,
        may_exist: bool,
    ) -> Result<Endpoint> {
        let found = remote(
            "find_endpoint",
            self.0
                .find_endpoint(context, &spec.service_id, spec.interface, &spec.region),
        )
        .await?;
        let name = format!("{}/{}/{}", spec.service_id, spec.interface, spec.region);
        if let Some(endpoint) = existing("endpoint", &name, found, may_exist)? {
            return Ok(endpoint);
        }
        let endpoint = remote("create_endpoint", self.0.create_endpoint(context, spec)).await?;
        created(context, "endpoint", &name, &endpoint.id);
        Ok(endpoint)
    }

    /// Fetch or create a project in a domain.
    pub async fn get_or_create_project(
        &self,
        context: &Context,
        spec: &ProjectSpec,
        may_exist: bool,
    ) -> Result<Project> {
        let found = self
            .find_project(context, &spec.name, &spec.domain_id)
            .await?;
        if let Some(project) = existing("project", &spec.name, found, may_exist)? {
            return Ok(project);
        }
        let project = remote("create_project", self.0.create_project(context, spec)).await?;
        created(context, "project", &project.name, &project.id);
        Ok(project)
    }

    /// Fetch or create a role.
    pub async fn get_or_create_role(
        &self,
        context: &Context,
        spec: &RoleSpec,
        may_exist: bool,
    ) -> Result<Role> {
        let found = remote("find_role", self.0.find_role(context, &spec.name)).await?;
        if let Some(role) = existing("role", &spec.name, found, may_exist)? {
            return Ok(role);
        }
        let role = remote("create_role", self.0.create_role(context, spec)).await?;
        created(context, "role", &role.name, &role.id);
        Ok(role)
    }

    /// Fetch or create a catalog service, identified by name and type.
    pub async fn get_or_create_service(
        &self,
        context: &Context,
        spec: &ServiceSpec,
        may_exist: bool,
    ) -> Result<Service> {
        let found = remote(
            "find_service",
            self.0.find_service(context, &spec.name, &spec.service_type),
        )
        .await?;
        if let Some(service) = existing("service", &spec.name, found, may_exist)? {
            return Ok(service);
        }
        let service = remote("create_service", self.0.create_service(context, spec)).await?;
        created(context, "service", &service.name, &service.id);
        Ok(service)
    }

    /// Fetch or create a user in a domain.
    ///
    /// The password of existing users is not changed.
    pub async fn get_or_create_user(
        &self,
        context: &Context,
        spec: &UserSpec,
        may_exist: bool,
    ) -> Result<User> {
        let found = self.find_user(context, &spec.name, &spec.domain_id).await?;
        if let Some(user) = existing("user", &spec.name, found, may_exist)? {
            return Ok(user);
        }
        let user = remote("create_user", self.0.create_user(context, spec)).await?;
        created(context, "user", &user.name, &user.id);
        Ok(user)
    }

    /// Grant a role to a user on a project.
    pub async fn grant_role(
        &self,
        context: &Context,
        role: &Role,
        user: &User,
        project: &Project,
        may_exist: bool,
    ) -> Result<()> {
        let granted = remote(
            "check_role_grant",
            self.0.has_role_grant(context, &role.id, &user.id, &project.id),
        )
        .await?;
        if granted {
            if !may_exist {
                let name = format!("{}@{}/{}", role.name, user.name, project.name);
                anyhow::bail!(AlreadyExists::new("role assignment", name));
            }
            return Ok(());
        }
        remote(
            "grant_role",
            self.0.grant_role(context, &role.id, &user.id, &project.id),
        )
        .await?;
        telemetry::CREATE_COUNT
            .with_label_values(&["role assignment"])
            .inc();
        slog::info!(
            context.logger, "Granted role to user";
            "role" => &role.name,
            "user" => &user.name,
            "project" => &project.name,
        );
        Ok(())
    }

    /// Read the fernet key ring used by the identity service.
    pub async fn read_fernet_keys(&self, context: &Context) -> Result<KeyRing> {
        remote("read_fernet_keys", self.0.read_fernet_keys(context)).await
    }

    /// Fetch or create an endpoint and make sure it points to the requested URL.
    pub async fn sync_endpoint_url(&self, context: &Context, spec: &EndpointSpec) -> Result<Endpoint> {
        let endpoint = self.get_or_create_endpoint(context, spec, true).await?;
        if endpoint.url == spec.url {
            return Ok(endpoint);
        }
        let endpoint = remote(
            "update_endpoint",
            self.0.update_endpoint_url(context, &endpoint.id, &spec.url),
        )
        .await?;
        slog::info!(
            context.logger, "Updated endpoint URL";
            "endpoint" => &endpoint.id,
            "interface" => endpoint.interface.as_str(),
            "url" => &endpoint.url,
        );
        Ok(endpoint)
    }

    /// Replace the fernet key ring used by the identity service.
    pub async fn write_fernet_keys(&self, context: &Context, keys: &KeyRing) -> Result<()> {
        remote("write_fernet_keys", self.0.write_fernet_keys(context, keys)).await
    }
}

impl<T> From<T> for IdentityAdmin
where
    T: IdentityAdminBackend + 'static,
{
    fn from(value: T) -> Self {
        IdentityAdmin(Arc::new(value))
    }
}

/// Operations implemented by identity service administration providers.
///
/// Lookups return `None` when the object does not exist.
#[async_trait::async_trait]
pub trait IdentityAdminBackend: Send + Sync {
    /// Create a domain.
    async fn create_domain(&self, context: &Context, spec: &DomainSpec) -> Result<Domain>;

    /// Create an endpoint.
    async fn create_endpoint(&self, context: &Context, spec: &EndpointSpec) -> Result<Endpoint>;

    /// Create a project.
    async fn create_project(&self, context: &Context, spec: &ProjectSpec) -> Result<Project>;

    /// Create a role.
    async fn create_role(&self, context: &Context, spec: &RoleSpec) -> Result<Role>;

    /// Create a catalog service.
    async fn create_service(&self, context: &Context, spec: &ServiceSpec) -> Result<Service>;

    /// Create a user.
    async fn create_user(&self, context: &Context, spec: &UserSpec) -> Result<User>;

    /// Lookup a domain by ID.
    async fn domain(&self, context: &Context, id: &str) -> Result<Option<Domain>>;

    /// Lookup a domain by name.
    async fn find_domain(&self, context: &Context, name: &str) -> Result<Option<Domain>>;

    /// Lookup the endpoint of a service on an interface and region.
    async fn find_endpoint(
        &self,
        context: &Context,
        service_id: &str,
        interface: Interface,
        region: &str,
    ) -> Result<Option<Endpoint>>;

    /// Lookup a project by name in a domain.
    async fn find_project(
        &self,
        context: &Context,
        name: &str,
        domain_id: &str,
    ) -> Result<Option<Project>>;

    /// Lookup a role by name.
    async fn find_role(&self, context: &Context, name: &str) -> Result<Option<Role>>;

    /// Lookup a catalog service by name and type.
    async fn find_service(
        &self,
        context: &Context,
        name: &str,
        service_type: &str,
    ) -> Result<Option<Service>>;

    /// Lookup a user by name in a domain.
    async fn find_user(
        &self,
        context: &Context,
        name: &str,
        domain_id: &str,
    ) -> Result<Option<User>>;

    /// Grant a role to a user on a project.
    async fn grant_role(
        &self,
        context: &Context,
        role_id: &str,
        user_id: &str,
        project_id: &str,
    ) -> Result<()>;

    /// Check if a user was granted a role on a project.
    async fn has_role_grant(
        &self,
        context: &Context,
        role_id: &str,
        user_id: &str,
        project_id: &str,
    ) -> Result<bool>;

    /// Read the fernet key ring used by the identity service.
    async fn read_fernet_keys(&self, context: &Context) -> Result<KeyRing>;

    /// Change the URL of an existing endpoint.
    async fn update_endpoint_url(
        &self,
        context: &Context,
        endpoint_id: &str,
        url: &str,
    ) -> Result<Endpoint>;

    /// Replace the fernet key ring used by the identity service.
    async fn write_fernet_keys(&self, context: &Context, keys: &KeyRing) -> Result<()>;
}

/// Record a newly created object.
fn created(context: &Context, kind: &'static str, name: &str, id: &str) {
    telemetry::CREATE_COUNT.with_label_values(&[kind]).inc();
    slog::info!(
        context.logger, "Created identity object";
        "kind" => kind,
        "name" => name,
        "id" => id,
    );
}

/// Apply the `may_exist` rule to the result of a lookup.
fn existing<T>(kind: &'static str, name: &str, found: Option<T>, may_exist: bool) -> Result<Option<T>> {
    match found {
        None => Ok(None),
        Some(_) if !may_exist => anyhow::bail!(AlreadyExists::new(kind, name)),
        Some(object) => Ok(Some(object)),
    }
}

/// Await a backend call and attach [`AdminApiError`] context to failures.
async fn remote<T, F>(operation: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match call.await {
        Ok(value) => Ok(value),
        Err(error) => {
            telemetry::OPERATION_ERR
                .with_label_values(&[operation])
                .inc();
            Err(error.context(AdminApiError::new(operation)))
        }
    }
}
