//! Identity objects managed by the operator and the attributes to create them with.
use serde::Deserialize;
use serde::Serialize;

/// A namespace for users and projects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
}

/// A catalog endpoint for a service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub interface: Interface,
    #[serde(rename = "region_id")]
    pub region: String,
    pub service_id: String,
    pub url: String,
}

/// Network interfaces an endpoint can be exposed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    Admin,
    Internal,
    Public,
}

impl Interface {
    /// All interfaces every service is registered on.
    pub const ALL: [Interface; 3] = [Interface::Admin, Interface::Internal, Interface::Public];

    /// Interface name as used by the identity API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interface::Admin => "admin",
            Interface::Internal => "internal",
            Interface::Public => "public",
        }
    }
}

impl std::fmt::Display for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container of resources users are granted roles on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub domain_id: String,
    pub id: String,
    pub name: String,
}

/// A named set of permissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

/// A service in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub description: String,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
}

/// A user account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub domain_id: String,
    pub id: String,
    pub name: String,
}

/// Attributes of a domain to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainSpec {
    pub description: String,
    pub name: String,
}

impl DomainSpec {
    /// Domain with the given name.
    pub fn named<S: Into<String>>(name: S) -> DomainSpec {
        DomainSpec {
            description: String::new(),
            name: name.into(),
        }
    }
}

/// Attributes of an endpoint to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointSpec {
    pub interface: Interface,
    pub region: String,
    pub service_id: String,
    pub url: String,
}

/// Attributes of a project to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectSpec {
    pub description: String,
    pub domain_id: String,
    pub name: String,
}

impl ProjectSpec {
    /// Project with the given name in the given domain.
    pub fn named<S1, S2>(name: S1, domain_id: S2) -> ProjectSpec
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ProjectSpec {
            description: String::new(),
            domain_id: domain_id.into(),
            name: name.into(),
        }
    }
}

/// Attributes of a role to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,
}

impl RoleSpec {
    /// Role with the given name.
    pub fn named<S: Into<String>>(name: S) -> RoleSpec {
        RoleSpec { name: name.into() }
    }
}

/// Attributes of a service to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceSpec {
    pub description: String,
    pub name: String,
    pub service_type: String,
}

/// Attributes of a user to create.
#[derive(Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub domain_id: String,
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSpec")
            .field("domain_id", &self.domain_id)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}
