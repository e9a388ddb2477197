//! Errors handling fernet keys.

/// The fernet key material is not valid.
#[derive(Debug, thiserror::Error)]
#[error("fernet key {index} is not valid: {reason}")]
pub struct InvalidKey {
    pub index: u32,
    pub reason: String,
}

impl InvalidKey {
    /// The fernet key at the given index is not valid.
    pub fn new<S: Into<String>>(index: u32, reason: S) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// The key ring has no staged key to promote.
#[derive(Debug, thiserror::Error)]
#[error("the key ring has no staged key to promote")]
pub struct MissingStagedKey;
