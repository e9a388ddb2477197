//! Read the operator configuration from YAML files.
use std::io::ErrorKind;

use anyhow::Context;
use anyhow::Result;

use crate::Conf;

/// Reasons the operator configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file at the path is not valid YAML for the configuration object.
    #[error("unable to decode configuration from file at '{0}'")]
    Decode(String),

    /// The configuration decoded but holds values the operator can't run with.
    #[error("invalid configuration in file at '{0}': {1}")]
    Invalid(String, &'static str),

    /// The file at the path exists but could not be read.
    #[error("unable to read configuration file at '{0}'")]
    Open(String),

    /// No file exists at the path.
    #[error("configuration file not found at '{0}'")]
    PathNotFound(String),
}

/// Load and validate the operator configuration stored at `path`.
pub fn load(path: &str) -> Result<Conf> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            anyhow::bail!(Error::PathNotFound(path.to_string()))
        }
        Err(error) => return Err(error).context(Error::Open(path.to_string())),
    };
    let conf: Conf =
        serde_yaml::from_str(&text).with_context(|| Error::Decode(path.to_string()))?;
    validate(&conf).map_err(|reason| Error::Invalid(path.to_string(), reason))?;
    Ok(conf)
}

fn validate(conf: &Conf) -> std::result::Result<(), &'static str> {
    if conf.app().is_empty() {
        return Err("unit name must start with the application name");
    }
    if conf.options.fernet_max_active_keys < 3 {
        return Err("fernet-max-active-keys must be at least 3");
    }
    if conf.runtime.heartbeat_interval_sec == 0 {
        return Err("runtime.heartbeat_interval_sec must be positive");
    }
    Ok(())
}
