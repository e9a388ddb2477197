//! Identity API v3 backend for identity service administration.
//!
//! Requests are authenticated with a project scoped token for the operator's own
//! administrative user. The token is requested on first use and requested again
//! if the identity service stops accepting it.
use anyhow::Context as AnyContext;
use anyhow::Result;
use reqwest::Client as ReqwestClient;
use reqwest::Method;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value as Json;
use tokio::sync::Mutex;

use idop_admin::Domain;
use idop_admin::DomainSpec;
use idop_admin::Endpoint;
use idop_admin::EndpointSpec;
use idop_admin::IdentityAdminBackend;
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
use idop_fernet::DirectoryKeys;
use idop_fernet::KeyRing;
use idop_passwords::PasswordStore;

pub mod error;
mod options;
mod wire;

pub use self::options::ClientOptions;

/// String to set as the user agent in HTTP request.
static CLIENT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Header the identity API returns issued tokens in.
const SUBJECT_TOKEN: &str = "X-Subject-Token";

/// Header requests present their token in.
const AUTH_TOKEN: &str = "X-Auth-Token";

/// Account the operator authenticates to the identity API with.
#[derive(Clone)]
pub struct AdminCredentials {
    /// ID of the domain the user and project belong to.
    pub domain_id: String,

    /// Password store the user password is kept in, under the user name.
    pub passwords: PasswordStore,

    /// Name of the project the token is scoped to.
    pub project: String,

    /// Name of the user to authenticate as.
    pub username: String,
}

/// Identity API v3 backend for identity service administration.
pub struct HttpAdmin {
    base: String,
    client: ReqwestClient,
    credentials: AdminCredentials,
    keys: DirectoryKeys,
    token: Mutex<Option<String>>,
}

impl HttpAdmin {
    /// Initialise a client with [`ClientOptions`].
    ///
    /// Fernet keys are managed through the given directory on the workload filesystem.
    pub fn with<O>(options: O, credentials: AdminCredentials, keys: DirectoryKeys) -> Result<HttpAdmin>
    where
        O: Into<ClientOptions>,
    {
        let options = options.into();
        let client = ReqwestClient::builder()
            .connect_timeout(options.timeout_connect)
            .timeout(options.timeout)
            .user_agent(CLIENT_USER_AGENT);
        let client = HttpAdmin {
            base: options.address,
            client: client.build()?,
            credentials,
            keys,
            token: Mutex::new(None),
        };
        Ok(client)
    }

    /// Request a new token from the identity service.
    async fn authenticate(&self, context: &Context) -> Result<String> {
        let username = &self.credentials.username;
        let password = self
            .credentials
            .passwords
            .retrieve(context, username)
            .await?
            .ok_or_else(|| error::MissingCredentials(username.clone()))?;
        let request = wire::auth_request(
            username,
            &password,
            &self.credentials.domain_id,
            &self.credentials.project,
        );
        let response = self
            .client
            .post(format!("{}/v3/auth/tokens", self.base))
            .json(&request)
            .send()
            .await?;
        let token = response
            .headers()
            .get(SUBJECT_TOKEN)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        error::inspect::<Json>(response).await?;
        let token = token.ok_or(error::MissingSubjectToken)?;
        slog::debug!(context.logger, "Authenticated with the identity service"; "user" => username);
        Ok(token)
    }

    /// Send an authenticated request and return the response.
    ///
    /// Rejected tokens are discarded and the request is sent once more with a new token.
    async fn send(
        &self,
        context: &Context,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Json>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/v3/{}", self.base, path);
        let mut retried = false;
        loop {
            let token = self.token(context).await?;
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header(AUTH_TOKEN, token)
                .query(query);
            if let Some(body) = body {
                request = request.json(body);
            }
            let response = request
                .send()
                .await
                .with_context(|| format!("request to {} failed", url))?;
            if response.status() == StatusCode::UNAUTHORIZED && !retried {
                retried = true;
                *self.token.lock().await = None;
                continue;
            }
            return Ok(response);
        }
    }

    /// Send an authenticated request and decode the response document.
    async fn call<T>(
        &self,
        context: &Context,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Json>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(context, method, path, query, body).await?;
        error::expect(response).await
    }

    /// Return the current token, authenticating first if needed.
    async fn token(&self, context: &Context) -> Result<String> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref() {
            return Ok(token.clone());
        }
        let fresh = self.authenticate(context).await?;
        *token = Some(fresh.clone());
        Ok(fresh)
    }

    /// Make sure the region an endpoint is registered in exists.
    async fn ensure_region(&self, context: &Context, region: &str) -> Result<()> {
        let path = format!("regions/{}", region);
        let response = self.send(context, Method::GET, &path, &[], None).await?;
        if response.status() != StatusCode::NOT_FOUND {
            error::inspect::<Json>(response).await?;
            return Ok(());
        }
        let body = wire::create_region(region);
        let _: Json = self
            .call(context, Method::POST, "regions", &[], Some(&body))
            .await?;
        slog::info!(context.logger, "Created catalog region"; "region" => region);
        Ok(())
    }
}

#[async_trait::async_trait]
impl IdentityAdminBackend for HttpAdmin {
    async fn create_domain(&self, context: &Context, spec: &DomainSpec) -> Result<Domain> {
        let body = wire::create_domain(spec);
        let response: wire::DomainBody = self
            .call(context, Method::POST, "domains", &[], Some(&body))
            .await?;
        Ok(response.domain)
    }

    async fn create_endpoint(&self, context: &Context, spec: &EndpointSpec) -> Result<Endpoint> {
        self.ensure_region(context, &spec.region).await?;
        let body = wire::create_endpoint(spec);
        let response: wire::EndpointBody = self
            .call(context, Method::POST, "endpoints", &[], Some(&body))
            .await?;
        Ok(response.endpoint)
    }

    async fn create_project(&self, context: &Context, spec: &ProjectSpec) -> Result<Project> {
        let body = wire::create_project(spec);
        let response: wire::ProjectBody = self
            .call(context, Method::POST, "projects", &[], Some(&body))
            .await?;
        Ok(response.project)
    }

    async fn create_role(&self, context: &Context, spec: &RoleSpec) -> Result<Role> {
        let body = wire::create_role(spec);
        let response: wire::RoleBody = self
            .call(context, Method::POST, "roles", &[], Some(&body))
            .await?;
        Ok(response.role)
    }

    async fn create_service(&self, context: &Context, spec: &ServiceSpec) -> Result<Service> {
        let body = wire::create_service(spec);
        let response: wire::ServiceBody = self
            .call(context, Method::POST, "services", &[], Some(&body))
            .await?;
        Ok(response.service)
    }

    async fn create_user(&self, context: &Context, spec: &UserSpec) -> Result<User> {
        let body = wire::create_user(spec);
        let response: wire::UserBody = self
            .call(context, Method::POST, "users", &[], Some(&body))
            .await?;
        Ok(response.user)
    }

    async fn domain(&self, context: &Context, id: &str) -> Result<Option<Domain>> {
        let path = format!("domains/{}", id);
        let response = self.send(context, Method::GET, &path, &[], None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response: wire::DomainBody = error::expect(response).await?;
        Ok(Some(response.domain))
    }

    async fn find_domain(&self, context: &Context, name: &str) -> Result<Option<Domain>> {
        let response: wire::DomainList = self
            .call(context, Method::GET, "domains", &[("name", name)], None)
            .await?;
        Ok(response.domains.into_iter().next())
    }

    async fn find_endpoint(
        &self,
        context: &Context,
        service_id: &str,
        interface: Interface,
        region: &str,
    ) -> Result<Option<Endpoint>> {
        let query = [
            ("service_id", service_id),
            ("interface", interface.as_str()),
            ("region_id", region),
        ];
        let response: wire::EndpointList = self
            .call(context, Method::GET, "endpoints", &query, None)
            .await?;
        let endpoint = response
            .endpoints
            .into_iter()
            .find(|endpoint| endpoint.region == region);
        Ok(endpoint)
    }

    async fn find_project(
        &self,
        context: &Context,
        name: &str,
        domain_id: &str,
    ) -> Result<Option<Project>> {
        let query = [("name", name), ("domain_id", domain_id)];
        let response: wire::ProjectList = self
            .call(context, Method::GET, "projects", &query, None)
            .await?;
        Ok(response.projects.into_iter().next())
    }

    async fn find_role(&self, context: &Context, name: &str) -> Result<Option<Role>> {
        let response: wire::RoleList = self
            .call(context, Method::GET, "roles", &[("name", name)], None)
            .await?;
        Ok(response.roles.into_iter().next())
    }

    async fn find_service(
        &self,
        context: &Context,
        name: &str,
        service_type: &str,
    ) -> Result<Option<Service>> {
        let response: wire::ServiceList = self
            .call(context, Method::GET, "services", &[("type", service_type)], None)
            .await?;
        let service = response
            .services
            .into_iter()
            .find(|service| service.name == name);
        Ok(service)
    }

    async fn find_user(
        &self,
        context: &Context,
        name: &str,
        domain_id: &str,
    ) -> Result<Option<User>> {
        let query = [("name", name), ("domain_id", domain_id)];
        let response: wire::UserList = self
            .call(context, Method::GET, "users", &query, None)
            .await?;
        Ok(response.users.into_iter().next())
    }

    async fn grant_role(
        &self,
        context: &Context,
        role_id: &str,
        user_id: &str,
        project_id: &str,
    ) -> Result<()> {
        let path = grant_path(role_id, user_id, project_id);
        let response = self.send(context, Method::PUT, &path, &[], None).await?;
        error::inspect::<Json>(response).await?;
        Ok(())
    }

    async fn has_role_grant(
        &self,
        context: &Context,
        role_id: &str,
        user_id: &str,
        project_id: &str,
    ) -> Result<bool> {
        let path = grant_path(role_id, user_id, project_id);
        let response = self.send(context, Method::HEAD, &path, &[], None).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            code if code.is_success() => Ok(true),
            _ => {
                error::inspect::<Json>(response).await?;
                Ok(false)
            }
        }
    }

    async fn read_fernet_keys(&self, context: &Context) -> Result<KeyRing> {
        self.keys.read(context).await
    }

    async fn update_endpoint_url(
        &self,
        context: &Context,
        endpoint_id: &str,
        url: &str,
    ) -> Result<Endpoint> {
        let path = format!("endpoints/{}", endpoint_id);
        let body = wire::update_endpoint_url(url);
        let response: wire::EndpointBody = self
            .call(context, Method::PATCH, &path, &[], Some(&body))
            .await?;
        Ok(response.endpoint)
    }

    async fn write_fernet_keys(&self, context: &Context, keys: &KeyRing) -> Result<()> {
        self.keys.write(context, keys).await
    }
}

/// Path of a project role assignment for a user.
fn grant_path(role_id: &str, user_id: &str, project_id: &str) -> String {
    format!("projects/{}/users/{}/roles/{}", project_id, user_id, role_id)
}

#[cfg(test)]
mod tests {
    use super::grant_path;
    use super::ClientOptions;
    use idop_conf::KeystoneApiConf;

    #[test]
    fn grant_path_layout() {
        assert_eq!(
            grant_path("r1", "u1", "p1"),
            "projects/p1/users/u1/roles/r1"
        );
    }

    #[test]
    fn options_from_conf() {
        let conf = KeystoneApiConf {
            timeout_sec: 3,
            timeout_connect_sec: 1,
            url: "http://10.0.0.1:5000/".into(),
        };
        let options = ClientOptions::from(&conf);
        assert_eq!(options.address, "http://10.0.0.1:5000");
        assert_eq!(options.timeout.as_secs(), 3);
    }
}
