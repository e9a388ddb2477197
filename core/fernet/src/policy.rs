//! Decide when the key ring is due for rotation.
use std::time::Duration;

use time::OffsetDateTime;

use crate::MIN_ACTIVE_KEYS;

/// Rotation schedule derived from the token lifetime settings.
///
/// Keys must outlive every token they encrypted, including tokens used after expiry
/// within the allowed window. With `N` active keys a key survives `N - 2` rotations
/// after it is promoted, so rotations must be at least `lifetime / (N - 2)` apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Seconds tokens can be used for after expiry.
    pub allow_expired_window: u64,

    /// Maximum number of active keys in the ring.
    pub max_active_keys: u32,

    /// Seconds issued tokens are valid for.
    pub token_expiration: u64,
}

impl RotationPolicy {
    /// Minimum time between two rotations of the key ring.
    pub fn interval(&self) -> Duration {
        let lifetime = self.token_expiration + self.allow_expired_window;
        let rotations = u64::from(self.max_active_keys.max(MIN_ACTIVE_KEYS) - 2);
        Duration::from_secs(lifetime / rotations)
    }

    /// Check if a rotation is due given the time of the last one.
    ///
    /// A ring that was never rotated is always due.
    pub fn is_due(&self, last: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
        let last = match last {
            None => return true,
            Some(last) => last,
        };
        let elapsed = now - last;
        elapsed >= self.interval()
    }
}
