//! Register identity-service consumers in the catalog.
use anyhow::Result;

use idop_admin::ServiceSpec;
use idop_context::Context;
use idop_relations::IdentityServiceBundle;
use idop_relations::IdentityServiceRequest;
use idop_relations::RelationRef;
use idop_relations::API_VERSION_IDENTITY;
use idop_relations::IDENTITY_SERVICE;

use crate::objects::identity_service;
use crate::objects::service_username;
use crate::objects::EndpointUrls;
use crate::Engine;
use crate::Topology;
use crate::SERVICE_PORT;

const PROTOCOL: &str = "http";

impl Engine {
    /// Register the services of a consumer in the catalog and publish its credentials.
    ///
    /// The consumer gets a service user named after its application and one catalog
    /// entry with three endpoints for each advertised service.
    pub async fn register_consumer(
        &self,
        context: &Context,
        relation: &RelationRef,
        request: &IdentityServiceRequest,
    ) -> Result<()> {
        let service = self.ensure_service_objects(context).await?;
        let role = self.ensure_admin_role(context).await?;
        let admin = self.ensure_admin_objects(context, &role).await?;
        let username = service_username(&relation.app);
        let account = self
            .ensure_service_user(context, &username, &service, &role)
            .await?;

        for endpoint in &request.service_endpoints {
            let spec = ServiceSpec {
                description: endpoint.description.clone(),
                name: endpoint.service_name.clone(),
                service_type: endpoint.service_type.clone(),
            };
            let urls = EndpointUrls::from(endpoint);
            self.ensure_catalog_entry(context, &spec, &request.region, &urls, false)
                .await?;
        }

        let state = self.injector.local.load(context).await?;
        let topology = Topology::resolve(&self.injector.conf, &state);
        let bundle = IdentityServiceBundle {
            api_version: API_VERSION_IDENTITY.into(),
            auth_host: topology.host.clone(),
            auth_port: SERVICE_PORT,
            auth_protocol: PROTOCOL.into(),
            internal_host: topology.host.clone(),
            internal_port: SERVICE_PORT,
            internal_protocol: PROTOCOL.into(),
            service_host: topology.host.clone(),
            service_port: SERVICE_PORT,
            service_protocol: PROTOCOL.into(),
            admin_auth_url: topology.admin,
            internal_auth_url: topology.internal,
            public_auth_url: topology.public,
            admin_domain_id: admin.domain.id,
            admin_domain_name: admin.domain.name,
            admin_project_id: admin.project.id,
            admin_project_name: admin.project.name,
            admin_user_id: admin.user.id,
            admin_user_name: admin.user.name,
            service_domain_id: service.domain.id,
            service_domain_name: service.domain.name,
            service_project_id: service.project.id,
            service_project_name: service.project.name,
            service_user_id: account.user.id,
            service_user_name: account.user.name,
            service_password: account.password,
        };
        self.injector
            .relations
            .publish(context, relation, bundle.to_data()?)
            .await?;
        slog::info!(
            context.logger, "Registered identity service consumer";
            "relation" => %relation,
            "services" => request.service_endpoints.len(),
        );
        Ok(())
    }

    /// Point the catalog at the current identity API URLs and refresh every consumer.
    ///
    /// Consumers with incomplete or invalid requests are skipped.
    pub async fn update_service_catalog(&self, context: &Context) -> Result<()> {
        let conf = &self.injector.conf;
        let state = self.injector.local.load(context).await?;
        let topology = Topology::resolve(conf, &state);
        self.ensure_catalog_entry(
            context,
            &identity_service(),
            &conf.options.region,
            &EndpointUrls::identity(&topology),
            true,
        )
        .await?;

        let relations = self.injector.relations.list(context, IDENTITY_SERVICE).await?;
        for relation in relations {
            let data = self.injector.relations.remote_data(context, &relation).await?;
            let request = match IdentityServiceRequest::from_data(&data) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(error) => {
                    slog::warn!(
                        context.logger, "Skipping consumer with invalid request";
                        "relation" => %relation,
                        "error" => format!("{:#}", error),
                    );
                    continue;
                }
            };
            self.register_consumer(context, &relation, &request).await?;
        }
        slog::info!(context.logger, "Service catalog updated"; "public_url" => &topology.public);
        Ok(())
    }
}
