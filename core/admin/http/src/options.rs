//! Options to initialise identity API clients with.
use std::time::Duration;

use idop_conf::KeystoneApiConf;

/// Options to initialise identity API clients with.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Base URL of the identity API, without the version prefix.
    pub address: String,

    /// Timeout for API requests to complete.
    pub timeout: Duration,

    /// Timeout to establish connections to the API server.
    pub timeout_connect: Duration,
}

impl From<&KeystoneApiConf> for ClientOptions {
    fn from(conf: &KeystoneApiConf) -> Self {
        ClientOptions {
            address: conf.url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(conf.timeout_sec),
            timeout_connect: Duration::from_secs(conf.timeout_connect_sec),
        }
    }
}
