//! Administrative actions answering with account credentials.
use std::fmt;

use anyhow::Result;
use serde::Serialize;

use idop_context::Context;
use idop_gate::Admission;
use idop_gate::Requirement;
use idop_relations::API_VERSION_CREDENTIALS;

use crate::Engine;
use crate::Topology;
use crate::ADMIN_PROJECT;

const ACTION_REQUIREMENTS: [Requirement; 3] = [
    Requirement::Leader,
    Requirement::WorkloadReady,
    Requirement::Bootstrapped,
];

/// Credentials of a service account.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceAccount {
    pub username: String,
    pub password: String,
    pub user_domain_name: String,
    pub project_name: String,
    pub project_domain_name: String,
    pub region: String,
    pub internal_endpoint: String,
    pub public_endpoint: String,
    pub api_version: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_domain_name", &self.user_domain_name)
            .field("project_name", &self.project_name)
            .field("project_domain_name", &self.project_domain_name)
            .field("region", &self.region)
            .field("internal_endpoint", &self.internal_endpoint)
            .field("public_endpoint", &self.public_endpoint)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Credentials of the cloud administrator along with a shell environment to use them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminAccount {
    #[serde(flatten)]
    pub account: ServiceAccount,

    /// Shell snippet exporting the credentials for command line clients.
    pub openrc: String,
}

impl AdminAccount {
    fn new(account: ServiceAccount) -> AdminAccount {
        let openrc = [
            format!("export OS_AUTH_URL={}", Topology::versioned(&account.public_endpoint)),
            format!("export OS_USERNAME={}", account.username),
            format!("export OS_PASSWORD={}", account.password),
            format!("export OS_USER_DOMAIN_NAME={}", account.user_domain_name),
            format!("export OS_PROJECT_NAME={}", account.project_name),
            format!("export OS_PROJECT_DOMAIN_NAME={}", account.project_domain_name),
            format!("export OS_AUTH_VERSION={}", account.api_version),
            format!("export OS_IDENTITY_API_VERSION={}", account.api_version),
            format!("export OS_REGION_NAME={}", account.region),
        ]
        .join("\n");
        AdminAccount { account, openrc }
    }
}

impl Engine {
    /// Return the credentials of a service user, creating the user if needed.
    pub async fn get_service_account(&self, context: &Context, username: &str) -> Result<ServiceAccount> {
        self.check_action(context).await?;
        let service = self.ensure_service_objects(context).await?;
        let role = self.ensure_admin_role(context).await?;
        let user = self
            .ensure_service_user(context, username, &service, &role)
            .await?;
        let topology = self.topology(context).await?;
        Ok(ServiceAccount {
            username: user.user.name,
            password: user.password,
            user_domain_name: service.domain.name.clone(),
            project_name: service.project.name,
            project_domain_name: service.domain.name,
            region: self.injector.conf.options.region.clone(),
            internal_endpoint: topology.internal,
            public_endpoint: topology.public,
            api_version: API_VERSION_CREDENTIALS.into(),
        })
    }

    /// Return the credentials of the cloud administrator.
    pub async fn get_admin_account(&self, context: &Context) -> Result<AdminAccount> {
        self.check_action(context).await?;
        let role = self.ensure_admin_role(context).await?;
        let admin = self.ensure_admin_objects(context, &role).await?;
        let topology = self.topology(context).await?;
        let account = ServiceAccount {
            username: admin.user.name,
            password: admin.password,
            user_domain_name: admin.domain.name.clone(),
            project_name: ADMIN_PROJECT.into(),
            project_domain_name: admin.domain.name,
            region: self.injector.conf.options.region.clone(),
            internal_endpoint: topology.internal,
            public_endpoint: topology.public,
            api_version: API_VERSION_CREDENTIALS.into(),
        };
        Ok(AdminAccount::new(account))
    }

    /// Fail unless the unit can run administrative actions.
    async fn check_action(&self, context: &Context) -> Result<()> {
        match self.injector.gate.check(context, &ACTION_REQUIREMENTS).await? {
            Admission::Admit => Ok(()),
            Admission::Defer(rejection) | Admission::Reject(rejection) => Err(rejection.into_error()),
        }
    }

    async fn topology(&self, context: &Context) -> Result<Topology> {
        let state = self.injector.local.load(context).await?;
        Ok(Topology::resolve(&self.injector.conf, &state))
    }
}

#[cfg(test)]
mod tests {
    use super::AdminAccount;
    use super::ServiceAccount;

    fn account() -> ServiceAccount {
        ServiceAccount {
            username: "admin".into(),
            password: "s3cret".into(),
            user_domain_name: "admin_domain".into(),
            project_name: "admin".into(),
            project_domain_name: "admin_domain".into(),
            region: "RegionOne".into(),
            internal_endpoint: "http://10.0.0.10:5000".into(),
            public_endpoint: "http://keystone.example.com:5000".into(),
            api_version: "3".into(),
        }
    }

    #[test]
    fn debug_hides_password() {
        let debug = format!("{:?}", account());
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn admin_openrc() {
        let admin = AdminAccount::new(account());
        assert!(admin
            .openrc
            .contains("export OS_AUTH_URL=http://keystone.example.com:5000/v3"));
        assert!(admin.openrc.contains("export OS_PASSWORD=s3cret"));
        assert!(admin.openrc.contains("export OS_REGION_NAME=RegionOne"));
    }

    #[test]
    fn kebab_case_output() {
        let value = serde_json::to_value(AdminAccount::new(account())).unwrap();
        assert_eq!(value["user-domain-name"], "admin_domain");
        assert_eq!(value["api-version"], "3");
        assert!(value["openrc"].as_str().unwrap().starts_with("export OS_AUTH_URL="));
    }
}
