//! Initialise process global resources for the selected command.
use std::path::Path;

use anyhow::Context as AnyContext;
use anyhow::Result;
use prometheus::Encoder;
use prometheus::Registry;
use prometheus::TextEncoder;
use slog::Logger;

use idop_admin::IdentityAdmin;
use idop_admin_http::AdminCredentials;
use idop_admin_http::HttpAdmin;
use idop_conf::Conf;
use idop_context::Context;
use idop_fernet::DirectoryKeys;
use idop_gate::Gate;
use idop_gate::StaticRole;
use idop_injector::Injector;
use idop_passwords::PasswordStore;
use idop_passwords::RandomPasswords;
use idop_reconcile::Engine;
use idop_relations::DirectoryRelations;
use idop_state::JsonFileState;
use idop_state::LocalState;
use idop_state::PeerState;
use idop_workload::LocalWorkload;

use crate::Cli;

/// Process global resources shared by all commands.
pub struct Globals {
    pub conf: Conf,
    pub context: Context,
    pub engine: Engine,
    pub registry: Registry,
}

impl Globals {
    /// Build all process dependencies from the configuration.
    pub fn initialise(cli: &Cli, conf: Conf, logger: Logger) -> Result<Globals> {
        let context = Context::root(logger).unit(conf.unit.clone()).build();
        let registry = Registry::new();
        idop_admin::register_metrics(&registry)?;
        idop_heartbeat::register_metrics(&registry)?;
        idop_reconcile::register_metrics(&registry)?;

        let state_dir = Path::new(&conf.paths.state_dir);
        let local = LocalState::from(JsonFileState::new(state_dir.join("local.json")));
        let peers = PeerState::from(JsonFileState::new(state_dir.join("peers.json")));
        let passwords = PasswordStore::new(peers.clone(), RandomPasswords::default());
        let workload = LocalWorkload::new(&conf.workload.root, &conf.workload.ready_marker);
        let workload = idop_workload::Workload::from(workload);

        let keys = Path::new(&conf.workload.root)
            .join(conf.workload.fernet_keys_dir.trim_start_matches('/'));
        let credentials = AdminCredentials {
            domain_id: idop_reconcile::DEFAULT_DOMAIN_ID.to_string(),
            passwords: passwords.clone(),
            project: idop_reconcile::ADMIN_PROJECT.to_string(),
            username: idop_reconcile::CHARM_USER.to_string(),
        };
        let admin = HttpAdmin::with(&conf.keystone, credentials, DirectoryKeys::new(keys))
            .context("failed to initialise identity API client")?;
        let admin = IdentityAdmin::from(admin);

        let role = if cli.leader {
            StaticRole::leader()
        } else {
            StaticRole::follower()
        };
        let gate = Gate::new(role.into(), workload.clone(), local.clone());
        let relations = DirectoryRelations::new(&conf.paths.relations_dir);

        let injector = Injector {
            admin,
            conf: conf.clone(),
            gate,
            local,
            passwords,
            peers,
            relations: relations.into(),
            workload,
        };
        slog::debug!(
            context.logger, "Operator process initialised";
            "leader" => cli.leader,
        );

        let engine = Engine::new(injector);
        Ok(Globals {
            conf,
            context,
            engine,
            registry,
        })
    }

    /// Write collected metrics to the configured file, if any.
    pub fn dump_metrics(&self) -> Result<()> {
        let path = match &self.conf.telemetry.metrics_file {
            None => return Ok(()),
            Some(path) => path,
        };
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("failed to encode metrics")?;
        std::fs::write(path, buffer)
            .with_context(|| format!("failed to write metrics to {}", path))?;
        Ok(())
    }
}
