//! Data object storing the operator's configuration.
use serde::Deserialize;
use serde::Serialize;

use super::CharmOptions;
use super::RuntimeConf;

/// Global configuration for the identity operator process.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conf {
    /// Access to the identity service administrative API.
    #[serde(default)]
    pub keystone: KeystoneApiConf,

    /// Network addresses the identity service is reachable at.
    #[serde(default)]
    pub network: NetworkConf,

    /// Options exposed to the deployment administrator.
    #[serde(default)]
    pub options: CharmOptions,

    /// Locations of operator owned state on the local filesystem.
    #[serde(default)]
    pub paths: PathsConf,

    /// Process runtime configuration.
    #[serde(default)]
    pub runtime: RuntimeConf,

    /// Telemetry configuration for the process.
    #[serde(default)]
    pub telemetry: TelemetryConf,

    /// Name of the unit managed by this process.
    #[serde(default = "Conf::default_unit")]
    pub unit: String,

    /// Workload container access configuration.
    #[serde(default)]
    pub workload: WorkloadConf,
}

impl Conf {
    fn default_unit() -> String {
        "keystone/0".into()
    }

    /// Name of the application the managed unit belongs to.
    pub fn app(&self) -> &str {
        match self.unit.split_once('/') {
            Some((app, _)) => app,
            None => &self.unit,
        }
    }
}

/// Access to the identity service administrative API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoneApiConf {
    /// Timeout, in seconds, for API requests to complete.
    #[serde(default = "KeystoneApiConf::default_timeout")]
    pub timeout_sec: u64,

    /// Timeout, in seconds, to establish connections to the API server.
    #[serde(default = "KeystoneApiConf::default_timeout_connect")]
    pub timeout_connect_sec: u64,

    /// Base URL of the identity API, without the version prefix.
    #[serde(default = "KeystoneApiConf::default_url")]
    pub url: String,
}

impl KeystoneApiConf {
    fn default_timeout() -> u64 {
        10
    }

    fn default_timeout_connect() -> u64 {
        5
    }

    fn default_url() -> String {
        "http://127.0.0.1:5000".into()
    }
}

impl Default for KeystoneApiConf {
    fn default() -> Self {
        KeystoneApiConf {
            timeout_sec: Self::default_timeout(),
            timeout_connect_sec: Self::default_timeout_connect(),
            url: Self::default_url(),
        }
    }
}

/// Network addresses the identity service is reachable at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConf {
    /// Address of the unit on the identity-service binding.
    #[serde(default = "NetworkConf::default_ingress_address")]
    pub ingress_address: String,

    /// Address of the unit on the public network, when different from the ingress address.
    #[serde(default)]
    pub public_ingress_address: Option<String>,
}

impl NetworkConf {
    fn default_ingress_address() -> String {
        "127.0.0.1".into()
    }
}

impl Default for NetworkConf {
    fn default() -> Self {
        NetworkConf {
            ingress_address: Self::default_ingress_address(),
            public_ingress_address: None,
        }
    }
}

/// Locations of operator owned state on the local filesystem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConf {
    /// Directory the relation exchange stores remote and published data in.
    #[serde(default = "PathsConf::default_relations_dir")]
    pub relations_dir: String,

    /// Directory local and peer state files are stored in.
    #[serde(default = "PathsConf::default_state_dir")]
    pub state_dir: String,
}

impl PathsConf {
    fn default_relations_dir() -> String {
        "/var/lib/idop/relations".into()
    }

    fn default_state_dir() -> String {
        "/var/lib/idop/state".into()
    }
}

impl Default for PathsConf {
    fn default() -> Self {
        PathsConf {
            relations_dir: Self::default_relations_dir(),
            state_dir: Self::default_state_dir(),
        }
    }
}

/// Telemetry configuration for the process.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConf {
    /// Write metrics in the prometheus text format to this file after each command.
    #[serde(default)]
    pub metrics_file: Option<String>,
}

/// Workload container access configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConf {
    /// Directory the identity service configuration files are rendered into.
    #[serde(default = "WorkloadConf::default_config_dir")]
    pub config_dir: String,

    /// Directory the fernet key ring is stored in.
    #[serde(default = "WorkloadConf::default_fernet_keys_dir")]
    pub fernet_keys_dir: String,

    /// Command used to run identity service management commands.
    #[serde(default = "WorkloadConf::default_manage_command")]
    pub manage_command: String,

    /// File that exists only when the workload is ready to accept commands.
    #[serde(default = "WorkloadConf::default_ready_marker")]
    pub ready_marker: String,

    /// Filesystem root of the workload container.
    #[serde(default = "WorkloadConf::default_root")]
    pub root: String,
}

impl WorkloadConf {
    fn default_config_dir() -> String {
        "/etc/keystone".into()
    }

    fn default_fernet_keys_dir() -> String {
        "/etc/keystone/fernet-keys".into()
    }

    fn default_manage_command() -> String {
        "keystone-manage".into()
    }

    fn default_ready_marker() -> String {
        "/run/keystone/ready".into()
    }

    fn default_root() -> String {
        "/".into()
    }
}

impl Default for WorkloadConf {
    fn default() -> Self {
        WorkloadConf {
            config_dir: Self::default_config_dir(),
            fernet_keys_dir: Self::default_fernet_keys_dir(),
            manage_command: Self::default_manage_command(),
            ready_marker: Self::default_ready_marker(),
            root: Self::default_root(),
        }
    }
}
