//! Request and response documents of the identity API v3.
use serde::Deserialize;
use serde_json::json;
use serde_json::Value as Json;

use idop_admin::Domain;
use idop_admin::DomainSpec;
use idop_admin::Endpoint;
use idop_admin::EndpointSpec;
use idop_admin::Project;
use idop_admin::ProjectSpec;
use idop_admin::Role;
use idop_admin::RoleSpec;
use idop_admin::Service;
use idop_admin::ServiceSpec;
use idop_admin::User;
use idop_admin::UserSpec;

#[derive(Debug, Deserialize)]
pub struct DomainBody {
    pub domain: Domain,
}

#[derive(Debug, Deserialize)]
pub struct DomainList {
    pub domains: Vec<Domain>,
}

#[derive(Debug, Deserialize)]
pub struct EndpointBody {
    pub endpoint: Endpoint,
}

#[derive(Debug, Deserialize)]
pub struct EndpointList {
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectBody {
    pub project: Project,
}

#[derive(Debug, Deserialize)]
pub struct ProjectList {
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct RoleList {
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceBody {
    pub service: Service,
}

#[derive(Debug, Deserialize)]
pub struct ServiceList {
    pub services: Vec<Service>,
}

#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct UserList {
    pub users: Vec<User>,
}

/// Password authentication request scoped to a project.
pub fn auth_request(
    username: &str,
    password: &str,
    domain_id: &str,
    project: &str,
) -> Json {
    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": username,
                        "domain": {"id": domain_id},
                        "password": password,
                    },
                },
            },
            "scope": {
                "project": {
                    "name": project,
                    "domain": {"id": domain_id},
                },
            },
        },
    })
}

pub fn create_domain(spec: &DomainSpec) -> Json {
    json!({
        "domain": {
            "name": spec.name,
            "description": spec.description,
            "enabled": true,
        },
    })
}

pub fn create_endpoint(spec: &EndpointSpec) -> Json {
    json!({
        "endpoint": {
            "interface": spec.interface.as_str(),
            "region_id": spec.region,
            "service_id": spec.service_id,
            "url": spec.url,
            "enabled": true,
        },
    })
}

pub fn create_project(spec: &ProjectSpec) -> Json {
    json!({
        "project": {
            "name": spec.name,
            "description": spec.description,
            "domain_id": spec.domain_id,
            "enabled": true,
        },
    })
}

pub fn create_region(id: &str) -> Json {
    json!({"region": {"id": id}})
}

pub fn create_role(spec: &RoleSpec) -> Json {
    json!({"role": {"name": spec.name}})
}

pub fn create_service(spec: &ServiceSpec) -> Json {
    json!({
        "service": {
            "name": spec.name,
            "type": spec.service_type,
            "description": spec.description,
            "enabled": true,
        },
    })
}

pub fn create_user(spec: &UserSpec) -> Json {
    json!({
        "user": {
            "name": spec.name,
            "domain_id": spec.domain_id,
            "password": spec.password,
            "enabled": true,
        },
    })
}

pub fn update_endpoint_url(url: &str) -> Json {
    json!({"endpoint": {"url": url}})
}
