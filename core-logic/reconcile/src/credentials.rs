//! Issue cloud credentials to identity-credentials consumers.
use anyhow::Result;

use idop_context::Context;
use idop_relations::CloudCredentialsBundle;
use idop_relations::CredentialsRequest;
use idop_relations::RelationRef;
use idop_relations::API_VERSION_CREDENTIALS;

use crate::Engine;
use crate::Topology;
use crate::SERVICE_PORT;

impl Engine {
    /// Create the requested user in the service domain and publish its credentials.
    pub async fn grant_credentials(
        &self,
        context: &Context,
        relation: &RelationRef,
        request: &CredentialsRequest,
    ) -> Result<()> {
        let service = self.ensure_service_objects(context).await?;
        let role = self.ensure_admin_role(context).await?;
        let account = self
            .ensure_service_user(context, &request.username, &service, &role)
            .await?;

        let state = self.injector.local.load(context).await?;
        let topology = Topology::resolve(&self.injector.conf, &state);
        let bundle = CloudCredentialsBundle {
            api_version: API_VERSION_CREDENTIALS.into(),
            auth_host: topology.host.clone(),
            auth_port: SERVICE_PORT,
            auth_protocol: "http".into(),
            internal_host: topology.host,
            internal_port: SERVICE_PORT,
            internal_protocol: "http".into(),
            username: account.user.name,
            password: account.password,
            project_name: service.project.name,
            project_id: service.project.id,
            user_domain_name: service.domain.name.clone(),
            user_domain_id: service.domain.id.clone(),
            project_domain_name: service.domain.name,
            project_domain_id: service.domain.id,
            region: self.injector.conf.options.region.clone(),
        };
        self.injector
            .relations
            .publish(context, relation, bundle.to_data()?)
            .await?;
        slog::info!(
            context.logger, "Issued cloud credentials";
            "relation" => %relation,
            "username" => &request.username,
        );
        Ok(())
    }
}
