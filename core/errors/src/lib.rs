//! Common errors from and for the identity operator implementation.

/// A remote identity API call failed.
#[derive(Debug, thiserror::Error)]
#[error("identity admin API operation '{operation}' failed")]
pub struct AdminApiError {
    pub operation: String,
}

impl AdminApiError {
    /// A remote identity API call failed while performing the given operation.
    pub fn new<S: Into<String>>(operation: S) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

/// The identity object already exists but the caller required it not to.
#[derive(Debug, thiserror::Error)]
#[error("the {kind} '{name}' already exists")]
pub struct AlreadyExists {
    pub kind: &'static str,
    pub name: String,
}

impl AlreadyExists {
    /// The identity object of the given kind and name already exists.
    pub fn new<S: Into<String>>(kind: &'static str, name: S) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// The identity service has not been bootstrapped yet.
#[derive(Debug, thiserror::Error)]
#[error("the identity service has not been bootstrapped yet")]
pub struct NotBootstrapped;

/// The operation can only be performed by the leader unit.
#[derive(Debug, thiserror::Error)]
#[error("the operation can only be performed by the leader unit")]
pub struct NotLeader;

/// An expected identity object was not found.
#[derive(Debug, thiserror::Error)]
#[error("the expected {kind} '{name}' was not found")]
pub struct ObjectNotFound {
    pub kind: &'static str,
    pub name: String,
}

impl ObjectNotFound {
    /// The expected identity object of the given kind and name was not found.
    pub fn new<S: Into<String>>(kind: &'static str, name: S) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// The workload container is not ready to accept commands.
#[derive(Debug, thiserror::Error)]
#[error("the workload container is not ready to accept commands")]
pub struct WorkloadNotReady;

/// Check if an error, any context attached to it, or any of its causes is of the given type.
pub fn caused_by<E>(error: &anyhow::Error) -> bool
where
    E: std::error::Error + Send + Sync + 'static,
{
    error.is::<E>() || error.chain().any(|cause| cause.is::<E>())
}

#[cfg(test)]
mod tests {
    use super::caused_by;
    use super::AdminApiError;
    use super::AlreadyExists;

    #[test]
    fn caused_by_finds_context() {
        let error = anyhow::anyhow!("connection refused").context(AdminApiError::new("list users"));
        assert!(caused_by::<AdminApiError>(&error));
        assert!(!caused_by::<AlreadyExists>(&error));
    }

    #[test]
    fn caused_by_finds_root() {
        let error = anyhow::anyhow!(AlreadyExists::new("user", "svc_glance"))
            .context("unable to register consumer");
        assert!(caused_by::<AlreadyExists>(&error));
        assert_eq!(
            format!("{}", error.root_cause()),
            "the user 'svc_glance' already exists"
        );
    }
}
