//! Requests consumers publish in their relation data.
use anyhow::Context as AnyContext;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::RelationData;

/// Remote key listing the services an identity-service consumer advertises.
const SERVICE_ENDPOINTS: &str = "service-endpoints";

/// The relation request published by the remote application is not valid.
#[derive(Debug, thiserror::Error)]
#[error("the relation request field '{field}' is not valid")]
pub struct InvalidRequest {
    pub field: String,
}

impl InvalidRequest {
    /// The given request field is not valid.
    pub fn new<S: Into<String>>(field: S) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Catalog registration request from an identity-service consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityServiceRequest {
    /// Region the advertised endpoints are registered in.
    pub region: String,

    /// Services the consumer provides, with the endpoints to register for each.
    pub service_endpoints: Vec<ServiceEndpointRequest>,
}

impl IdentityServiceRequest {
    /// Decode a request from the remote relation data.
    ///
    /// Returns `None` while the consumer has not published a complete request.
    pub fn from_data(data: &RelationData) -> Result<Option<IdentityServiceRequest>> {
        let (endpoints, region) = match (data.get(SERVICE_ENDPOINTS), data.get("region")) {
            (Some(endpoints), Some(region)) => (endpoints, region),
            _ => return Ok(None),
        };
        let service_endpoints = serde_json::from_str(endpoints)
            .context(InvalidRequest::new(SERVICE_ENDPOINTS))?;
        let request = IdentityServiceRequest {
            region: region.clone(),
            service_endpoints,
        };
        request.validate()?;
        Ok(Some(request))
    }

    /// Check the request names a region and every service it advertises.
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            anyhow::bail!(InvalidRequest::new("region"));
        }
        let unnamed = self.service_endpoints.iter().any(|endpoint| {
            endpoint.service_name.trim().is_empty() || endpoint.service_type.trim().is_empty()
        });
        if unnamed {
            anyhow::bail!(InvalidRequest::new(SERVICE_ENDPOINTS));
        }
        Ok(())
    }
}

/// A service advertised by an identity-service consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpointRequest {
    /// Name of the service in the catalog.
    pub service_name: String,

    /// Type of the service in the catalog.
    #[serde(rename = "type")]
    pub service_type: String,

    /// Human readable description of the service.
    #[serde(default)]
    pub description: String,

    /// URL of the admin endpoint.
    pub admin_url: String,

    /// URL of the internal endpoint.
    pub internal_url: String,

    /// URL of the public endpoint.
    pub public_url: String,
}

/// Cloud credentials request from an identity-credentials consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRequest {
    /// Name of the user to create credentials for.
    pub username: String,
}

impl CredentialsRequest {
    /// Decode a request from the remote relation data.
    ///
    /// Returns `None` while the consumer has not published a username.
    pub fn from_data(data: &RelationData) -> Result<Option<CredentialsRequest>> {
        let username = match data.get("username") {
            None => return Ok(None),
            Some(username) => username.trim(),
        };
        let request = CredentialsRequest {
            username: username.to_string(),
        };
        request.validate()?;
        Ok(Some(request))
    }

    /// Check the username is not empty and has no surrounding whitespace.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.username.trim() != self.username {
            anyhow::bail!(InvalidRequest::new("username"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CredentialsRequest;
    use super::IdentityServiceRequest;
    use super::InvalidRequest;
    use crate::RelationData;

    fn cinder_data() -> RelationData {
        let endpoints = r#"[
            {
                "service_name": "cinderv2",
                "type": "volumev2",
                "description": "Cinder Volume Service v2",
                "internal_url": "http://10.0.0.20:8776/v2/$(tenant_id)s",
                "public_url": "http://10.0.0.20:8776/v2/$(tenant_id)s",
                "admin_url": "http://10.0.0.20:8776/v2/$(tenant_id)s"
            },
            {
                "service_name": "cinderv3",
                "type": "volumev3",
                "description": "Cinder Volume Service v3",
                "internal_url": "http://10.0.0.20:8776/v3/$(tenant_id)s",
                "public_url": "http://10.0.0.20:8776/v3/$(tenant_id)s",
                "admin_url": "http://10.0.0.20:8776/v3/$(tenant_id)s"
            }
        ]"#;
        let mut data = RelationData::new();
        data.insert("region".into(), "RegionOne".into());
        data.insert("service-endpoints".into(), endpoints.into());
        data
    }

    #[test]
    fn identity_request_decode() {
        let request = IdentityServiceRequest::from_data(&cinder_data())
            .unwrap()
            .unwrap();
        assert_eq!(request.region, "RegionOne");
        assert_eq!(request.service_endpoints.len(), 2);
        assert_eq!(request.service_endpoints[1].service_type, "volumev3");
    }

    #[test]
    fn identity_request_incomplete() {
        let mut data = cinder_data();
        data.remove("service-endpoints");
        let request = IdentityServiceRequest::from_data(&data).unwrap();
        assert_eq!(request, None);
    }

    #[test]
    fn identity_request_invalid() {
        let mut data = cinder_data();
        data.insert("service-endpoints".into(), "[{".into());
        match IdentityServiceRequest::from_data(&data) {
            Err(error) if error.is::<InvalidRequest>() => (),
            Err(error) => panic!("unexpected error: {:?}", error),
            Ok(_) => panic!("invalid request was decoded"),
        }
    }

    #[test]
    fn credentials_request_decode() {
        let mut data = RelationData::new();
        assert_eq!(CredentialsRequest::from_data(&data).unwrap(), None);
        data.insert("username".into(), "operator".into());
        let request = CredentialsRequest::from_data(&data).unwrap().unwrap();
        assert_eq!(request.username, "operator");
    }

    #[test]
    fn identity_request_without_region() {
        let mut data = cinder_data();
        data.insert("region".into(), " ".into());
        match IdentityServiceRequest::from_data(&data) {
            Err(error) if error.is::<InvalidRequest>() => (),
            Err(error) => panic!("unexpected error: {:?}", error),
            Ok(_) => panic!("request without region was accepted"),
        }
    }

    #[test]
    fn credentials_request_validate() {
        let request = CredentialsRequest {
            username: " operator".into(),
        };
        assert!(request.validate().is_err());
        let request = CredentialsRequest {
            username: "operator".into(),
        };
        request.validate().unwrap();
    }

    #[test]
    fn credentials_request_empty_username() {
        let mut data = RelationData::new();
        data.insert("username".into(), "  ".into());
        match CredentialsRequest::from_data(&data) {
            Err(error) if error.is::<InvalidRequest>() => (),
            Err(error) => panic!("unexpected error: {:?}", error),
            Ok(_) => panic!("empty username was accepted"),
        }
    }
}
