//! Operator options exposed to the deployment administrator.
use serde::Deserialize;
use serde::Serialize;

/// Operator options exposed to the deployment administrator.
///
/// Option names follow the kebab-case convention of the deployment tooling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CharmOptions {
    /// Name of the role granted to administrative and service users.
    #[serde(default = "CharmOptions::default_admin_role")]
    pub admin_role: String,

    /// Name of the cloud administrator user.
    #[serde(default = "CharmOptions::default_admin_user")]
    pub admin_user: String,

    /// Allow expired tokens to be used for this many seconds after expiry.
    #[serde(default = "CharmOptions::default_allow_expired_window")]
    pub allow_expired_window: u64,

    /// Seconds the catalog is cached for.
    #[serde(default = "CharmOptions::default_cache_expiration")]
    pub catalog_cache_expiration: u64,

    /// Enable debug logging in the identity service.
    #[serde(default)]
    pub debug: bool,

    /// Seconds the identity service caches backend lookups for.
    #[serde(default = "CharmOptions::default_cache_expiration")]
    pub dogpile_cache_expiration: u64,

    /// Maximum number of active keys in the fernet key ring.
    #[serde(default = "CharmOptions::default_fernet_max_active_keys")]
    pub fernet_max_active_keys: u32,

    /// Log level for the identity service (DEBUG, INFO, WARNING, ERROR).
    #[serde(default = "CharmOptions::default_log_level")]
    pub log_level: String,

    /// Hostname advertised for the admin endpoint.
    #[serde(default)]
    pub os_admin_hostname: Option<String>,

    /// Hostname advertised for the internal endpoint.
    #[serde(default)]
    pub os_internal_hostname: Option<String>,

    /// Hostname advertised for the public endpoint.
    #[serde(default)]
    pub os_public_hostname: Option<String>,

    /// Region endpoints are registered in.
    #[serde(default = "CharmOptions::default_region")]
    pub region: String,

    /// Name of the project service users are granted access to.
    #[serde(default = "CharmOptions::default_service_tenant")]
    pub service_tenant: String,

    /// Seconds issued tokens are valid for.
    #[serde(default = "CharmOptions::default_token_expiration")]
    pub token_expiration: u64,
}

impl CharmOptions {
    fn default_admin_role() -> String {
        "Admin".into()
    }

    fn default_admin_user() -> String {
        "admin".into()
    }

    fn default_allow_expired_window() -> u64 {
        169200
    }

    fn default_cache_expiration() -> u64 {
        60
    }

    fn default_fernet_max_active_keys() -> u32 {
        3
    }

    fn default_log_level() -> String {
        "WARNING".into()
    }

    fn default_region() -> String {
        "RegionOne".into()
    }

    fn default_service_tenant() -> String {
        "services".into()
    }

    fn default_token_expiration() -> u64 {
        3600
    }
}

impl Default for CharmOptions {
    fn default() -> Self {
        CharmOptions {
            admin_role: Self::default_admin_role(),
            admin_user: Self::default_admin_user(),
            allow_expired_window: Self::default_allow_expired_window(),
            catalog_cache_expiration: Self::default_cache_expiration(),
            debug: false,
            dogpile_cache_expiration: Self::default_cache_expiration(),
            fernet_max_active_keys: Self::default_fernet_max_active_keys(),
            log_level: Self::default_log_level(),
            os_admin_hostname: None,
            os_internal_hostname: None,
            os_public_hostname: None,
            region: Self::default_region(),
            service_tenant: Self::default_service_tenant(),
            token_expiration: Self::default_token_expiration(),
        }
    }
}
