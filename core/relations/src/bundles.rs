//! Data published by the operator in answer to consumer requests.
use anyhow::Result;
use serde::Serialize;
use serde_json::Value as Json;

use crate::RelationData;

/// API version advertised on identity-service relations.
pub const API_VERSION_IDENTITY: &str = "v3";

/// API version advertised on identity-credentials relations.
pub const API_VERSION_CREDENTIALS: &str = "3";

/// Catalog registration answer for an identity-service consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IdentityServiceBundle {
    pub api_version: String,
    pub auth_host: String,
    pub auth_port: u16,
    pub auth_protocol: String,
    pub internal_host: String,
    pub internal_port: u16,
    pub internal_protocol: String,
    pub service_host: String,
    pub service_port: u16,
    pub service_protocol: String,
    pub admin_auth_url: String,
    pub internal_auth_url: String,
    pub public_auth_url: String,
    pub admin_domain_id: String,
    pub admin_domain_name: String,
    pub admin_project_id: String,
    pub admin_project_name: String,
    pub admin_user_id: String,
    pub admin_user_name: String,
    pub service_domain_id: String,
    pub service_domain_name: String,
    pub service_project_id: String,
    pub service_project_name: String,
    pub service_user_id: String,
    pub service_user_name: String,
    pub service_password: String,
}

impl IdentityServiceBundle {
    /// Convert the bundle into relation data.
    pub fn to_data(&self) -> Result<RelationData> {
        to_data(self)
    }
}

/// Credentials answer for an identity-credentials consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CloudCredentialsBundle {
    pub api_version: String,
    pub auth_host: String,
    pub auth_port: u16,
    pub auth_protocol: String,
    pub internal_host: String,
    pub internal_port: u16,
    pub internal_protocol: String,
    pub username: String,
    pub password: String,
    pub project_name: String,
    pub project_id: String,
    pub user_domain_name: String,
    pub user_domain_id: String,
    pub project_domain_name: String,
    pub project_domain_id: String,
    pub region: String,
}

impl CloudCredentialsBundle {
    /// Convert the bundle into relation data.
    pub fn to_data(&self) -> Result<RelationData> {
        to_data(self)
    }
}

/// Flatten a serializable bundle into a string map.
fn to_data<T: Serialize>(bundle: &T) -> Result<RelationData> {
    let fields = match serde_json::to_value(bundle)? {
        Json::Object(fields) => fields,
        other => anyhow::bail!("relation bundles must be objects, found {}", other),
    };
    let data = fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| match value {
            Json::String(value) => (key, value),
            other => (key, other.to_string()),
        })
        .collect();
    Ok(data)
}
