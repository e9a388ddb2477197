//! Errors raised while reconciling events.
use crate::RequestState;

/// The identity service bootstrap sequence did not complete.
#[derive(Debug, thiserror::Error)]
#[error("identity service bootstrap failed while trying to {step}")]
pub struct BootstrapFailure {
    pub step: &'static str,
}

impl BootstrapFailure {
    pub fn new(step: &'static str) -> Self {
        Self { step }
    }
}

/// A relation request was moved to a state it can't reach from its current one.
#[derive(Debug, thiserror::Error)]
#[error("relation request can't move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: RequestState,
    pub to: RequestState,
}

/// A service account was requested with the name of an administrative user.
#[derive(Debug, thiserror::Error)]
#[error("username '{username}' is reserved for administrative users")]
pub struct ReservedUsername {
    pub username: String,
}

impl ReservedUsername {
    pub fn new<S: Into<String>>(username: S) -> Self {
        Self {
            username: username.into(),
        }
    }
}
