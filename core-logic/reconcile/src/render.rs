//! Render identity service configuration files from typed contexts.
use std::fmt;

use anyhow::Context as AnyContext;
use anyhow::Result;

use idop_conf::CharmOptions;
use idop_conf::Conf;
use idop_context::Context;
use idop_state::UnitState;

use crate::Engine;
use crate::Topology;
use crate::ADMIN_PROJECT;

/// Log levels the identity service understands.
pub const LOG_LEVELS: [&str; 4] = ["DEBUG", "INFO", "WARNING", "ERROR"];

const AUTH_METHODS: &str = "external,password,token,oauth1,mapped";
const DOMAIN_CONFIG_DIR: &str = "/etc/keystone/domains";
const LOG_FILE: &str = "/var/log/keystone/keystone.log";

/// Context for the main identity service configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeystoneConfig {
    pub admin_domain_name: String,
    pub admin_endpoint: String,
    pub admin_role: String,
    pub allow_expired_window: u64,
    pub catalog_cache_expiration: u64,
    pub debug: bool,
    pub default_domain_id: Option<String>,
    pub dogpile_cache_expiration: u64,
    pub fernet_keys_dir: String,
    pub fernet_max_active_keys: u32,
    pub log_config: String,
    pub public_endpoint: String,
    pub token_expiration: u64,
}

impl KeystoneConfig {
    pub fn new(conf: &Conf, state: &UnitState, topology: &Topology) -> KeystoneConfig {
        let options = &conf.options;
        KeystoneConfig {
            admin_domain_name: state.admin_domain_name.clone(),
            admin_endpoint: topology.admin.clone(),
            admin_role: options.admin_role.clone(),
            allow_expired_window: options.allow_expired_window,
            catalog_cache_expiration: options.catalog_cache_expiration,
            debug: options.debug,
            default_domain_id: state.default_domain_id.clone(),
            dogpile_cache_expiration: options.dogpile_cache_expiration,
            fernet_keys_dir: conf.workload.fernet_keys_dir.clone(),
            fernet_max_active_keys: options.fernet_max_active_keys,
            log_config: config_path(conf, "logging.conf"),
            public_endpoint: topology.public.clone(),
            token_expiration: options.token_expiration,
        }
    }
}

impl fmt::Display for KeystoneConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[DEFAULT]")?;
        writeln!(f, "debug = {}", self.debug)?;
        writeln!(f, "log_config_append = {}", self.log_config)?;
        writeln!(f, "public_endpoint = {}", self.public_endpoint)?;
        writeln!(f, "admin_endpoint = {}", self.admin_endpoint)?;
        writeln!(f, "member_role_name = {}", self.admin_role)?;
        writeln!(f)?;

        writeln!(f, "[identity]")?;
        writeln!(f, "driver = sql")?;
        if let Some(id) = &self.default_domain_id {
            writeln!(f, "default_domain_id = {}", id)?;
        }
        writeln!(f, "domain_specific_drivers_enabled = true")?;
        writeln!(f, "domain_config_dir = {}", DOMAIN_CONFIG_DIR)?;
        writeln!(f)?;

        writeln!(f, "[assignment]")?;
        writeln!(f, "driver = sql")?;
        writeln!(f)?;

        writeln!(f, "[resource]")?;
        writeln!(f, "driver = sql")?;
        writeln!(f, "admin_project_domain_name = {}", self.admin_domain_name)?;
        writeln!(f, "admin_project_name = {}", ADMIN_PROJECT)?;
        writeln!(f)?;

        writeln!(f, "[catalog]")?;
        writeln!(f, "cache_time = {}", self.catalog_cache_expiration)?;
        writeln!(f, "driver = sql")?;
        writeln!(f)?;

        writeln!(f, "[token]")?;
        writeln!(f, "provider = fernet")?;
        writeln!(f, "expiration = {}", self.token_expiration)?;
        writeln!(f, "allow_expired_window = {}", self.allow_expired_window)?;
        writeln!(f)?;

        writeln!(f, "[fernet_tokens]")?;
        writeln!(f, "key_repository = {}", self.fernet_keys_dir)?;
        writeln!(f, "max_active_keys = {}", self.fernet_max_active_keys)?;
        writeln!(f)?;

        writeln!(f, "[auth]")?;
        writeln!(f, "methods = {}", AUTH_METHODS)?;
        writeln!(f)?;

        writeln!(f, "[cache]")?;
        writeln!(f, "enabled = true")?;
        writeln!(f, "backend = oslo_cache.dict")?;
        writeln!(f, "expiration_time = {}", self.dogpile_cache_expiration)
    }
}

/// Context for the identity service logging configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level of the file handler, omitted when the option is not valid.
    pub log_level: Option<String>,
    pub root_level: &'static str,
}

impl LoggingConfig {
    /// Build the logging context, degrading invalid log levels to the handler default.
    pub fn from_options(context: &Context, options: &CharmOptions) -> LoggingConfig {
        let root_level = if options.debug { "DEBUG" } else { "WARNING" };
        let log_level = if LOG_LEVELS.contains(&options.log_level.as_str()) {
            Some(options.log_level.clone())
        } else {
            slog::error!(
                context.logger,
                "Option log-level must be one of DEBUG, INFO, WARNING, ERROR";
                "log_level" => &options.log_level,
            );
            None
        };
        LoggingConfig {
            log_level,
            root_level,
        }
    }
}

impl fmt::Display for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[loggers]")?;
        writeln!(f, "keys = root")?;
        writeln!(f)?;
        writeln!(f, "[handlers]")?;
        writeln!(f, "keys = file")?;
        writeln!(f)?;
        writeln!(f, "[formatters]")?;
        writeln!(f, "keys = default")?;
        writeln!(f)?;
        writeln!(f, "[logger_root]")?;
        writeln!(f, "level = {}", self.root_level)?;
        writeln!(f, "handlers = file")?;
        writeln!(f)?;
        writeln!(f, "[handler_file]")?;
        writeln!(f, "class = FileHandler")?;
        if let Some(level) = &self.log_level {
            writeln!(f, "level = {}", level)?;
        }
        writeln!(f, "formatter = default")?;
        writeln!(f, "args = ('{}', 'a')", LOG_FILE)?;
        writeln!(f)?;
        writeln!(f, "[formatter_default]")?;
        writeln!(
            f,
            "format = %(asctime)s %(process)d %(levelname)s %(name)s %(message)s"
        )
    }
}

impl Engine {
    /// Render the identity service configuration and push it to the workload.
    pub async fn configure(&self, context: &Context) -> Result<()> {
        let conf = &self.injector.conf;
        let state = self.injector.local.load(context).await?;
        let topology = Topology::resolve(conf, &state);

        let keystone = KeystoneConfig::new(conf, &state, &topology).to_string();
        let logging = LoggingConfig::from_options(context, &conf.options).to_string();
        for (name, content) in [("keystone.conf", keystone), ("logging.conf", logging)] {
            let path = config_path(conf, name);
            self.injector
                .workload
                .push_file(context, &path, &content)
                .await
                .with_context(|| format!("failed to push configuration file {}", path))?;
        }
        slog::debug!(context.logger, "Identity service configuration rendered");
        Ok(())
    }
}

fn config_path(conf: &Conf, name: &str) -> String {
    format!("{}/{}", conf.workload.config_dir.trim_end_matches('/'), name)
}
