//! Individual fernet keys.
use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

use crate::InvalidKey;

/// Number of random bytes in a fernet key (signing half and encryption half).
const KEY_BYTES: usize = 32;

/// A single fernet key in its URL-safe base64 text form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FernetKey(String);

impl FernetKey {
    /// Generate a new random key.
    pub fn generate() -> FernetKey {
        let mut bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill(&mut bytes);
        FernetKey(URL_SAFE.encode(bytes))
    }

    /// Parse and validate key material read from storage for the key at `index`.
    pub fn parse(index: u32, text: &str) -> Result<FernetKey> {
        let text = text.trim();
        let bytes = URL_SAFE
            .decode(text)
            .map_err(|error| InvalidKey::new(index, error.to_string()))?;
        if bytes.len() != KEY_BYTES {
            let reason = format!("expected {} bytes, found {}", KEY_BYTES, bytes.len());
            anyhow::bail!(InvalidKey::new(index, reason));
        }
        Ok(FernetKey(text.to_string()))
    }

    /// Access the key material in text form.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for FernetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FernetKey(<redacted>)")
    }
}
