//! Fernet key ring used by the identity service to encrypt and validate tokens.
//!
//! The key ring is an ordered set of keys identified by a numeric index:
//!
//! - Index `0` is the staged key: it will become the next primary key.
//! - The highest index is the primary key: tokens are encrypted with it.
//! - Any other index is a secondary key: tokens encrypted with them are still valid.
//!
//! Rotating the ring promotes the staged key to primary, generates a new staged key
//! and retires the oldest secondary keys once the ring exceeds the maximum active keys.
mod directory;
mod errors;
mod key;
mod policy;
mod ring;

pub use self::directory::DirectoryKeys;
pub use self::errors::InvalidKey;
pub use self::errors::MissingStagedKey;
pub use self::key::FernetKey;
pub use self::policy::RotationPolicy;
pub use self::ring::KeyRing;
pub use self::ring::Rotation;

/// Smallest number of active keys a ring can be rotated with.
///
/// A staged, a primary and at least one secondary key are needed for tokens
/// to survive a rotation.
pub const MIN_ACTIVE_KEYS: u32 = 3;
