//! In-memory identity service for unit tests.
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use idop_context::Context;
use idop_fernet::KeyRing;

use super::Domain;
use super::DomainSpec;
use super::Endpoint;
use super::EndpointSpec;
use super::IdentityAdminBackend;
use super::Interface;
use super::Project;
use super::ProjectSpec;
use super::Role;
use super::RoleSpec;
use super::Service;
use super::ServiceSpec;
use super::User;
use super::UserSpec;

/// In-memory identity service for unit tests.
///
/// The fixture counts objects created on it and can be told to fail operations
/// by name (for example `create_user` or `find_domain`).
/// A `default` domain exists from the start, as it would after the service bootstrap.
#[derive(Clone)]
pub struct AdminFixture {
    inner: Arc<Mutex<AdminFixtureState>>,
}

impl Default for AdminFixture {
    fn default() -> Self {
        let mut state = AdminFixtureState::default();
        state.domains.push(Domain {
            id: "default".into(),
            name: "Default".into(),
        });
        AdminFixture {
            inner: Arc::new(Mutex::new(state)),
        }
    }
}

impl AdminFixture {
    /// Lock and access the shared inner state.
    fn access(&self) -> MutexGuard<AdminFixtureState> {
        self.inner
            .lock()
            .expect("AdminFixture::inner state lock poisoned")
    }

    /// Number of objects of the given kind created on the fixture.
    pub fn created(&self, kind: &str) -> usize {
        self.access().creations.get(kind).copied().unwrap_or(0)
    }

    /// Snapshot of all endpoints in the catalog.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.access().endpoints.clone()
    }

    /// Fail the named operation until [`AdminFixture::heal`] is called.
    pub fn fail(&self, operation: &str) {
        self.access().failing.insert(operation.to_string());
    }

    /// Check if a user was granted a role on a project, by names.
    pub fn granted(&self, role: &str, user: &str, project: &str) -> bool {
        let state = self.access();
        let role = state.roles.iter().find(|r| r.name == role);
        let user = state.users.iter().find(|(u, _)| u.name == user);
        let project = state.projects.iter().find(|p| p.name == project);
        match (role, user, project) {
            (Some(role), Some((user, _)), Some(project)) => state.grants.contains(&(
                role.id.clone(),
                user.id.clone(),
                project.id.clone(),
            )),
            _ => false,
        }
    }

    /// Stop failing operations.
    pub fn heal(&self) {
        self.access().failing.clear();
    }

    /// Current fernet key ring.
    pub fn keys(&self) -> KeyRing {
        self.access().keys.clone()
    }

    /// Password a user was created with.
    pub fn password(&self, name: &str) -> Option<String> {
        self.access()
            .users
            .iter()
            .find(|(user, _)| user.name == name)
            .map(|(_, password)| password.clone())
    }

    /// Snapshot of all services in the catalog.
    pub fn services(&self) -> Vec<Service> {
        self.access().services.clone()
    }

    /// Number of write operations (creations, grants, updates) performed so far.
    pub fn writes(&self) -> usize {
        let state = self.access();
        state.creations.values().sum::<usize>() + state.endpoint_updates
    }
}

#[async_trait::async_trait]
impl IdentityAdminBackend for AdminFixture {
    async fn create_domain(&self, _: &Context, spec: &DomainSpec) -> Result<Domain> {
        let mut state = self.access();
        state.check("create_domain")?;
        let domain = Domain {
            id: state.next_id("domain"),
            name: spec.name.clone(),
        };
        state.domains.push(domain.clone());
        Ok(domain)
    }

    async fn create_endpoint(&self, _: &Context, spec: &EndpointSpec) -> Result<Endpoint> {
        let mut state = self.access();
        state.check("create_endpoint")?;
        let endpoint = Endpoint {
            id: state.next_id("endpoint"),
            interface: spec.interface,
            region: spec.region.clone(),
            service_id: spec.service_id.clone(),
            url: spec.url.clone(),
        };
        state.endpoints.push(endpoint.clone());
        Ok(endpoint)
    }

    async fn create_project(&self, _: &Context, spec: &ProjectSpec) -> Result<Project> {
        let mut state = self.access();
        state.check("create_project")?;
        let project = Project {
            domain_id: spec.domain_id.clone(),
            id: state.next_id("project"),
            name: spec.name.clone(),
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn create_role(&self, _: &Context, spec: &RoleSpec) -> Result<Role> {
        let mut state = self.access();
        state.check("create_role")?;
        let role = Role {
            id: state.next_id("role"),
            name: spec.name.clone(),
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn create_service(&self, _: &Context, spec: &ServiceSpec) -> Result<Service> {
        let mut state = self.access();
        state.check("create_service")?;
        let service = Service {
            description: spec.description.clone(),
            id: state.next_id("service"),
            name: spec.name.clone(),
            service_type: spec.service_type.clone(),
        };
        state.services.push(service.clone());
        Ok(service)
    }

    async fn create_user(&self, _: &Context, spec: &UserSpec) -> Result<User> {
        let mut state = self.access();
        state.check("create_user")?;
        let user = User {
            domain_id: spec.domain_id.clone(),
            id: state.next_id("user"),
            name: spec.name.clone(),
        };
        state.users.push((user.clone(), spec.password.clone()));
        Ok(user)
    }

    async fn domain(&self, _: &Context, id: &str) -> Result<Option<Domain>> {
        let state = self.access();
        state.check("get_domain")?;
        Ok(state.domains.iter().find(|d| d.id == id).cloned())
    }

    async fn find_domain(&self, _: &Context, name: &str) -> Result<Option<Domain>> {
        let state = self.access();
        state.check("find_domain")?;
        Ok(state.domains.iter().find(|d| d.name == name).cloned())
    }

    async fn find_endpoint(
        &self,
        _: &Context,
        service_id: &str,
        interface: Interface,
        region: &str,
    ) -> Result<Option<Endpoint>> {
        let state = self.access();
        state.check("find_endpoint")?;
        let endpoint = state
            .endpoints
            .iter()
            .find(|e| e.service_id == service_id && e.interface == interface && e.region == region)
            .cloned();
        Ok(endpoint)
    }

    async fn find_project(
        &self,
        _: &Context,
        name: &str,
        domain_id: &str,
    ) -> Result<Option<Project>> {
        let state = self.access();
        state.check("find_project")?;
        let project = state
            .projects
            .iter()
            .find(|p| p.name == name && p.domain_id == domain_id)
            .cloned();
        Ok(project)
    }

    async fn find_role(&self, _: &Context, name: &str) -> Result<Option<Role>> {
        let state = self.access();
        state.check("find_role")?;
        Ok(state.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn find_service(
        &self,
        _: &Context,
        name: &str,
        service_type: &str,
    ) -> Result<Option<Service>> {
        let state = self.access();
        state.check("find_service")?;
        let service = state
            .services
            .iter()
            .find(|s| s.name == name && s.service_type == service_type)
            .cloned();
        Ok(service)
    }

    async fn find_user(&self, _: &Context, name: &str, domain_id: &str) -> Result<Option<User>> {
        let state = self.access();
        state.check("find_user")?;
        let user = state
            .users
            .iter()
            .map(|(user, _)| user)
            .find(|u| u.name == name && u.domain_id == domain_id)
            .cloned();
        Ok(user)
    }

    async fn grant_role(
        &self,
        _: &Context,
        role_id: &str,
        user_id: &str,
        project_id: &str,
    ) -> Result<()> {
        let mut state = self.access();
        state.check("grant_role")?;
        state.grants.insert((
            role_id.to_string(),
            user_id.to_string(),
            project_id.to_string(),
        ));
        *state.creations.entry("role assignment".into()).or_default() += 1;
        Ok(())
    }

    async fn has_role_grant(
        &self,
        _: &Context,
        role_id: &str,
        user_id: &str,
        project_id: &str,
    ) -> Result<bool> {
        let state = self.access();
        state.check("check_role_grant")?;
        let grant = (
            role_id.to_string(),
            user_id.to_string(),
            project_id.to_string(),
        );
        Ok(state.grants.contains(&grant))
    }

    async fn read_fernet_keys(&self, _: &Context) -> Result<KeyRing> {
        let state = self.access();
        state.check("read_fernet_keys")?;
        Ok(state.keys.clone())
    }

    async fn update_endpoint_url(
        &self,
        _: &Context,
        endpoint_id: &str,
        url: &str,
    ) -> Result<Endpoint> {
        let mut state = self.access();
        state.check("update_endpoint")?;
        state.endpoint_updates += 1;
        let endpoint = match state.endpoints.iter_mut().find(|e| e.id == endpoint_id) {
            Some(endpoint) => endpoint,
            None => anyhow::bail!("endpoint {} not found", endpoint_id),
        };
        endpoint.url = url.to_string();
        Ok(endpoint.clone())
    }

    async fn write_fernet_keys(&self, _: &Context, keys: &KeyRing) -> Result<()> {
        let mut state = self.access();
        state.check("write_fernet_keys")?;
        state.keys = keys.clone();
        Ok(())
    }
}

/// Container for the shared state.
#[derive(Default)]
struct AdminFixtureState {
    creations: BTreeMap<String, usize>,
    domains: Vec<Domain>,
    endpoint_updates: usize,
    endpoints: Vec<Endpoint>,
    failing: BTreeSet<String>,
    grants: BTreeSet<(String, String, String)>,
    keys: KeyRing,
    last_id: u32,
    projects: Vec<Project>,
    roles: Vec<Role>,
    services: Vec<Service>,
    users: Vec<(User, String)>,
}

impl AdminFixtureState {
    /// Fail if the operation was marked as failing.
    fn check(&self, operation: &str) -> Result<()> {
        if self.failing.contains(operation) {
            anyhow::bail!("injected failure for {}", operation);
        }
        Ok(())
    }

    /// Generate an ID for a new object and count its creation.
    fn next_id(&mut self, kind: &str) -> String {
        self.last_id += 1;
        *self.creations.entry(kind.to_string()).or_default() += 1;
        format!("{}-{}", kind, self.last_id)
    }
}
