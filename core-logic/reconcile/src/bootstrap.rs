//! First time initialisation of the identity service.
use anyhow::Context as AnyContext;
use anyhow::Result;
use time::OffsetDateTime;

use idop_context::Context;
use idop_errors::ObjectNotFound;
use idop_fernet::KeyRing;
use idop_state::UnitStatus;

use crate::objects::identity_service;
use crate::objects::EndpointUrls;
use crate::BootstrapFailure;
use crate::Engine;
use crate::Topology;
use crate::ADMIN_PROJECT;
use crate::CHARM_USER;
use crate::DEFAULT_DOMAIN_ID;

/// Identifiers recorded once the bootstrap sequence completes.
struct Bootstrapped {
    admin_domain_id: String,
    admin_domain_name: String,
    default_domain_id: String,
    service_domain_id: String,
    service_project_id: String,
}

impl Engine {
    /// Bootstrap the identity service and create the objects the operator relies on.
    ///
    /// Every step is idempotent so a failed sequence is retried from the start.
    /// On failure the unit is blocked and the bootstrapped flag is left unset.
    pub async fn bootstrap(&self, context: &Context) -> Result<()> {
        slog::info!(context.logger, "Bootstrapping the identity service");
        let ids = match self.bootstrap_sequence(context).await {
            Ok(ids) => ids,
            Err(error) => {
                slog::error!(
                    context.logger, "Identity service bootstrap failed";
                    "error" => format!("{:#}", error),
                );
                let message = error.to_string();
                self.injector
                    .local
                    .update(context, |state| {
                        state.bootstrapped = false;
                        state.status = UnitStatus::Blocked(message);
                    })
                    .await?;
                return Err(error);
            }
        };

        self.injector
            .local
            .update(context, |state| {
                state.admin_domain_id = Some(ids.admin_domain_id);
                state.admin_domain_name = ids.admin_domain_name;
                state.bootstrapped = true;
                state.default_domain_id = Some(ids.default_domain_id);
                state.service_domain_id = Some(ids.service_domain_id);
                state.service_project_id = Some(ids.service_project_id);
                state.status = UnitStatus::Active;
            })
            .await?;
        self.injector
            .peers
            .set_leader_ready(context)
            .await
            .context("failed to signal the identity service is ready")?;
        slog::info!(context.logger, "Identity service bootstrapped");
        Ok(())
    }

    async fn bootstrap_sequence(&self, context: &Context) -> Result<Bootstrapped> {
        let conf = &self.injector.conf;
        let state = self.injector.local.load(context).await?;
        let topology = Topology::resolve(conf, &state);
        let manage: Vec<&str> = conf.workload.manage_command.split_whitespace().collect();

        let mut command = manage.clone();
        command.push("db_sync");
        self.injector
            .workload
            .exec(context, &command)
            .await
            .context(BootstrapFailure::new("sync the database"))?;

        self.init_fernet_keys(context)
            .await
            .context(BootstrapFailure::new("initialise fernet keys"))?;

        let password = self
            .injector
            .passwords
            .retrieve_or_generate(context, CHARM_USER)
            .await
            .context(BootstrapFailure::new("generate the operator password"))?;
        let urls = EndpointUrls::identity(&topology);
        let mut command = manage;
        command.extend([
            "bootstrap",
            "--bootstrap-username",
            CHARM_USER,
            "--bootstrap-password",
            password.as_str(),
            "--bootstrap-project-name",
            ADMIN_PROJECT,
            "--bootstrap-role-name",
            conf.options.admin_role.as_str(),
            "--bootstrap-region-id",
            conf.options.region.as_str(),
            "--bootstrap-admin-url",
            urls.admin.as_str(),
            "--bootstrap-internal-url",
            urls.internal.as_str(),
            "--bootstrap-public-url",
            urls.public.as_str(),
        ]);
        self.injector
            .workload
            .exec(context, &command)
            .await
            .context(BootstrapFailure::new("bootstrap the identity service"))?;

        let role = self
            .ensure_admin_role(context)
            .await
            .context(BootstrapFailure::new("create the admin role"))?;
        let admin = self
            .ensure_admin_objects(context, &role)
            .await
            .context(BootstrapFailure::new("create the administrative objects"))?;
        let service = self
            .ensure_service_objects(context)
            .await
            .context(BootstrapFailure::new("create the service objects"))?;
        let default_domain = self
            .injector
            .admin
            .domain(context, DEFAULT_DOMAIN_ID)
            .await
            .and_then(|domain| {
                domain.ok_or_else(|| anyhow::anyhow!(ObjectNotFound::new("domain", DEFAULT_DOMAIN_ID)))
            })
            .context(BootstrapFailure::new("look up the default domain"))?;
        self.ensure_catalog_entry(
            context,
            &identity_service(),
            &conf.options.region,
            &urls,
            true,
        )
        .await
        .context(BootstrapFailure::new("register the identity service"))?;

        Ok(Bootstrapped {
            admin_domain_id: admin.domain.id,
            admin_domain_name: admin.domain.name,
            default_domain_id: default_domain.id,
            service_domain_id: service.domain.id,
            service_project_id: service.project.id,
        })
    }

    /// Write the initial key ring unless one is already in place.
    ///
    /// A new ring counts as a rotation so the next one waits a full interval.
    async fn init_fernet_keys(&self, context: &Context) -> Result<()> {
        let ring = self.injector.admin.read_fernet_keys(context).await?;
        if !ring.is_empty() {
            return Ok(());
        }
        self.injector
            .admin
            .write_fernet_keys(context, &KeyRing::initial())
            .await?;
        self.injector
            .peers
            .set_last_fernet_rotation(context, OffsetDateTime::now_utc())
            .await?;
        slog::info!(context.logger, "Initialised fernet key ring");
        Ok(())
    }
}
