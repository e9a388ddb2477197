//! Persisted table of logical name to secret for credentials the operator manages.
//!
//! Secrets are generated once, persisted in the replicated peer state and reused for
//! every later request so redelivered events never change a credential.
use std::sync::Arc;

use anyhow::Result;
use rand::distributions::Alphanumeric;
use rand::Rng;

use idop_context::Context;
use idop_state::PeerState;

/// Prefix of peer state keys storing passwords.
const KEY_PREFIX: &str = "password_";

/// Default length of generated passwords.
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// Source of new secrets.
pub trait PasswordGenerator: Send + Sync {
    /// Generate a new secret.
    fn generate(&self) -> String;
}

/// Generate random alphanumeric passwords.
#[derive(Clone, Copy, Debug)]
pub struct RandomPasswords {
    length: usize,
}

impl RandomPasswords {
    /// Generate random passwords of the given length.
    pub fn with_length(length: usize) -> RandomPasswords {
        RandomPasswords { length }
    }
}

impl Default for RandomPasswords {
    fn default() -> Self {
        RandomPasswords::with_length(DEFAULT_PASSWORD_LENGTH)
    }
}

impl PasswordGenerator for RandomPasswords {
    fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Persisted table of logical name to secret.
#[derive(Clone)]
pub struct PasswordStore {
    generator: Arc<dyn PasswordGenerator>,
    peers: PeerState,
}

impl PasswordStore {
    /// Store passwords in peer state, generating new ones with the given generator.
    pub fn new<G>(peers: PeerState, generator: G) -> PasswordStore
    where
        G: PasswordGenerator + 'static,
    {
        PasswordStore {
            generator: Arc::new(generator),
            peers,
        }
    }

    /// Lookup the secret stored for a logical name.
    ///
    /// A name with no secret is not an error.
    pub async fn retrieve(&self, context: &Context, name: &str) -> Result<Option<String>> {
        self.peers.get(context, &key(name)).await
    }

    /// Lookup the secret stored for a logical name, generating and storing one if needed.
    pub async fn retrieve_or_generate(&self, context: &Context, name: &str) -> Result<String> {
        if let Some(secret) = self.retrieve(context, name).await? {
            return Ok(secret);
        }
        let secret = self.generator.generate();
        self.store(context, name, &secret).await?;
        slog::info!(context.logger, "Generated new password"; "name" => name);
        Ok(secret)
    }

    /// Store the secret for a logical name, replacing any previous one.
    pub async fn store(&self, context: &Context, name: &str, secret: &str) -> Result<()> {
        self.peers.set(context, &key(name), secret.to_string()).await
    }
}

/// Peer state key for the given logical name.
fn key(name: &str) -> String {
    format!("{}{}", KEY_PREFIX, name)
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::SequencePasswords;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use std::sync::atomic::AtomicU16;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::PasswordGenerator;

    /// Generate predictable passwords for unit tests: `password-1`, `password-2`, ...
    #[derive(Clone, Default)]
    pub struct SequencePasswords(Arc<AtomicU16>);

    impl SequencePasswords {
        /// Number of passwords generated so far.
        pub fn generated(&self) -> u16 {
            self.0.load(Ordering::Relaxed)
        }
    }

    impl PasswordGenerator for SequencePasswords {
        fn generate(&self) -> String {
            let next = self.0.fetch_add(1, Ordering::Relaxed) + 1;
            format!("password-{}", next)
        }
    }
}

#[cfg(test)]
mod tests {
    use idop_context::Context;
    use idop_state::PeerState;
    use idop_state::StateFixture;

    use super::PasswordGenerator;
    use super::PasswordStore;
    use super::RandomPasswords;
    use super::SequencePasswords;

    fn fixture() -> (PasswordStore, SequencePasswords, PeerState) {
        let generator = SequencePasswords::default();
        let peers = PeerState::from(StateFixture::default());
        let store = PasswordStore::new(peers.clone(), generator.clone());
        (store, generator, peers)
    }

    #[test]
    fn random_passwords() {
        let generator = RandomPasswords::default();
        let password = generator.generate();
        assert_eq!(password.len(), 12);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generator.generate());
    }

    #[tokio::test]
    async fn retrieve_missing_is_none() {
        let (store, _, _) = fixture();
        let secret = store.retrieve(&Context::fixture(), "admin").await.unwrap();
        assert_eq!(secret, None);
    }

    #[tokio::test]
    async fn store_then_retrieve() {
        let context = Context::fixture();
        let (store, _, peers) = fixture();
        store.store(&context, "admin", "s3cret").await.unwrap();
        let secret = store.retrieve(&context, "admin").await.unwrap();
        assert_eq!(secret.as_deref(), Some("s3cret"));
        let raw = peers.get(&context, "password_admin").await.unwrap();
        assert_eq!(raw.as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn generate_once() {
        let context = Context::fixture();
        let (store, generator, _) = fixture();
        let first = store
            .retrieve_or_generate(&context, "svc_glance")
            .await
            .unwrap();
        let second = store
            .retrieve_or_generate(&context, "svc_glance")
            .await
            .unwrap();
        assert_eq!(first, "password-1");
        assert_eq!(first, second);
        assert_eq!(generator.generated(), 1);
    }

    #[tokio::test]
    async fn names_are_independent() {
        let context = Context::fixture();
        let (store, _, _) = fixture();
        let glance = store
            .retrieve_or_generate(&context, "svc_glance")
            .await
            .unwrap();
        let nova = store
            .retrieve_or_generate(&context, "svc_nova")
            .await
            .unwrap();
        assert_ne!(glance, nova);
    }
}
