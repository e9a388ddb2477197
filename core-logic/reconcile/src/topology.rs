//! URLs the identity service is reachable at.
use idop_conf::Conf;
use idop_state::UnitState;

use crate::SERVICE_PORT;

/// Base URLs of the identity API for each catalog interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    pub admin: String,

    /// Address consumers connect to directly, used in relation bundles.
    pub host: String,

    pub internal: String,
    pub public: String,
}

impl Topology {
    /// Resolve the identity API URLs from options, network bindings and ingress.
    ///
    /// Ingress URLs take precedence over hostname options for internal and public URLs.
    /// Without either the ingress address of the unit is used.
    pub fn resolve(conf: &Conf, state: &UnitState) -> Topology {
        let options = &conf.options;
        let ingress = &conf.network.ingress_address;

        let admin = url_for(options.os_admin_hostname.as_deref().unwrap_or(ingress));
        let internal = match &state.ingress_internal_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => url_for(options.os_internal_hostname.as_deref().unwrap_or(ingress)),
        };
        let public = match &state.ingress_public_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => {
                let host = options
                    .os_public_hostname
                    .as_deref()
                    .or(conf.network.public_ingress_address.as_deref())
                    .unwrap_or(ingress);
                url_for(host)
            }
        };
        Topology {
            admin,
            host: ingress.clone(),
            internal,
            public,
        }
    }

    /// Versioned identity API URL for catalog endpoints.
    pub fn versioned(url: &str) -> String {
        format!("{}/v3", url.trim_end_matches('/'))
    }
}

fn url_for(host: &str) -> String {
    format!("http://{}:{}", host, SERVICE_PORT)
}
