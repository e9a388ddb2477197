//! Identity objects shared by the reconciliation operations.
use anyhow::Result;

use idop_admin::Domain;
use idop_admin::DomainSpec;
use idop_admin::EndpointSpec;
use idop_admin::Interface;
use idop_admin::Project;
use idop_admin::ProjectSpec;
use idop_admin::Role;
use idop_admin::RoleSpec;
use idop_admin::Service;
use idop_admin::ServiceSpec;
use idop_admin::User;
use idop_admin::UserSpec;
use idop_context::Context;
use idop_relations::ServiceEndpointRequest;

use crate::Engine;
use crate::ReservedUsername;
use crate::Topology;
use crate::ADMIN_DOMAIN;
use crate::ADMIN_PROJECT;
use crate::CHARM_USER;
use crate::SERVICE_DOMAIN;

/// Administrative domain, project and user.
pub(crate) struct AdminObjects {
    pub domain: Domain,
    pub password: String,
    pub project: Project,
    pub user: User,
}

/// Domain and project service users are created in.
pub(crate) struct ServiceObjects {
    pub domain: Domain,
    pub project: Project,
}

/// A user granted the admin role on the service project.
pub(crate) struct ServiceUser {
    pub password: String,
    pub user: User,
}

/// URLs of a catalog service for each interface.
pub(crate) struct EndpointUrls {
    pub admin: String,
    pub internal: String,
    pub public: String,
}

impl EndpointUrls {
    /// Versioned URLs of the identity API itself.
    pub fn identity(topology: &Topology) -> EndpointUrls {
        EndpointUrls {
            admin: Topology::versioned(&topology.admin),
            internal: Topology::versioned(&topology.internal),
            public: Topology::versioned(&topology.public),
        }
    }

    pub fn get(&self, interface: Interface) -> &str {
        match interface {
            Interface::Admin => &self.admin,
            Interface::Internal => &self.internal,
            Interface::Public => &self.public,
        }
    }
}

impl From<&ServiceEndpointRequest> for EndpointUrls {
    fn from(request: &ServiceEndpointRequest) -> Self {
        EndpointUrls {
            admin: request.admin_url.clone(),
            internal: request.internal_url.clone(),
            public: request.public_url.clone(),
        }
    }
}

/// Catalog entry of the identity service.
pub(crate) fn identity_service() -> ServiceSpec {
    ServiceSpec {
        description: "Keystone Identity Service".into(),
        name: "keystone".into(),
        service_type: "identity".into(),
    }
}

/// Password store name of a service user, scoped to the domain it lives in.
pub(crate) fn service_password_name(domain: &str, username: &str) -> String {
    format!("svc:{}/{}", domain, username)
}

/// Name of the service user created for a consumer application.
pub(crate) fn service_username(app: &str) -> String {
    format!("svc_{}", app.replace('-', "_"))
}

impl Engine {
    /// Ensure the administrative objects exist and the admin user holds the role on the admin project.
    ///
    /// The admin user password is generated once and kept in the password store.
    pub(crate) async fn ensure_admin_objects(
        &self,
        context: &Context,
        role: &Role,
    ) -> Result<AdminObjects> {
        let admin = &self.injector.admin;
        let options = &self.injector.conf.options;
        let domain = admin
            .get_or_create_domain(context, &DomainSpec::named(ADMIN_DOMAIN), true)
            .await?;
        let project = admin
            .get_or_create_project(context, &ProjectSpec::named(ADMIN_PROJECT, &domain.id), true)
            .await?;
        let password = self
            .injector
            .passwords
            .retrieve_or_generate(context, &options.admin_user)
            .await?;
        let spec = UserSpec {
            domain_id: domain.id.clone(),
            name: options.admin_user.clone(),
            password: password.clone(),
        };
        let user = admin.get_or_create_user(context, &spec, true).await?;
        admin.grant_role(context, role, &user, &project, true).await?;
        Ok(AdminObjects {
            domain,
            password,
            project,
            user,
        })
    }

    /// Ensure the role granted to administrative and service users exists.
    pub(crate) async fn ensure_admin_role(&self, context: &Context) -> Result<Role> {
        let name = &self.injector.conf.options.admin_role;
        self.injector
            .admin
            .get_or_create_role(context, &RoleSpec::named(name), true)
            .await
    }

    /// Ensure a catalog service exists along with its admin, internal and public endpoints.
    ///
    /// With `sync` set existing endpoints are updated to the given URLs,
    /// otherwise they are left as they are.
    pub(crate) async fn ensure_catalog_entry(
        &self,
        context: &Context,
        spec: &ServiceSpec,
        region: &str,
        urls: &EndpointUrls,
        sync: bool,
    ) -> Result<Service> {
        let admin = &self.injector.admin;
        let service = admin.get_or_create_service(context, spec, true).await?;
        for interface in Interface::ALL {
            let endpoint = EndpointSpec {
                interface,
                region: region.to_string(),
                service_id: service.id.clone(),
                url: urls.get(interface).to_string(),
            };
            if sync {
                admin.sync_endpoint_url(context, &endpoint).await?;
            } else {
                admin.get_or_create_endpoint(context, &endpoint, true).await?;
            }
        }
        Ok(service)
    }

    /// Ensure the service domain and project exist.
    pub(crate) async fn ensure_service_objects(&self, context: &Context) -> Result<ServiceObjects> {
        let admin = &self.injector.admin;
        let tenant = &self.injector.conf.options.service_tenant;
        let domain = admin
            .get_or_create_domain(context, &DomainSpec::named(SERVICE_DOMAIN), true)
            .await?;
        let project = admin
            .get_or_create_project(context, &ProjectSpec::named(tenant, &domain.id), true)
            .await?;
        Ok(ServiceObjects { domain, project })
    }

    /// Ensure a service user exists and holds the role on the service project.
    ///
    /// The password is generated the first time the user is seen and reused afterwards.
    /// Names of administrative users are refused so their passwords are never handed out.
    pub(crate) async fn ensure_service_user(
        &self,
        context: &Context,
        name: &str,
        service: &ServiceObjects,
        role: &Role,
    ) -> Result<ServiceUser> {
        if name == CHARM_USER || name == self.injector.conf.options.admin_user {
            anyhow::bail!(ReservedUsername::new(name));
        }
        let admin = &self.injector.admin;
        let password = self
            .injector
            .passwords
            .retrieve_or_generate(context, &service_password_name(&service.domain.name, name))
            .await?;
        let spec = UserSpec {
            domain_id: service.domain.id.clone(),
            name: name.to_string(),
            password: password.clone(),
        };
        let user = admin.get_or_create_user(context, &spec, true).await?;
        admin
            .grant_role(context, role, &user, &service.project, true)
            .await?;
        Ok(ServiceUser { password, user })
    }
}
