//! Periodic rotation of the fernet key ring.
use anyhow::Result;
use time::OffsetDateTime;

use idop_context::Context;
use idop_fernet::KeyRing;
use idop_fernet::RotationPolicy;

use crate::telemetry::ROTATIONS;
use crate::Engine;

impl Engine {
    /// Rotation schedule derived from the operator options.
    pub fn rotation_policy(&self) -> RotationPolicy {
        let options = &self.injector.conf.options;
        RotationPolicy {
            allow_expired_window: options.allow_expired_window,
            max_active_keys: options.fernet_max_active_keys,
            token_expiration: options.token_expiration,
        }
    }

    /// Rotate the fernet key ring if a rotation is due now.
    ///
    /// Returns `true` if the key ring changed.
    pub async fn rotate_fernet_keys(&self, context: &Context) -> Result<bool> {
        self.rotate_fernet_keys_at(context, OffsetDateTime::now_utc())
            .await
    }

    /// Rotate the fernet key ring if a rotation is due at the given time.
    pub async fn rotate_fernet_keys_at(&self, context: &Context, now: OffsetDateTime) -> Result<bool> {
        let policy = self.rotation_policy();
        let last = self.injector.peers.last_fernet_rotation(context).await?;
        if !policy.is_due(last, now) {
            slog::debug!(
                context.logger, "Fernet key rotation is not due";
                "last_rotation" => last.map(|last| last.unix_timestamp()),
            );
            return Ok(false);
        }

        let admin = &self.injector.admin;
        let mut ring = admin.read_fernet_keys(context).await?;
        if ring.is_empty() {
            admin.write_fernet_keys(context, &KeyRing::initial()).await?;
            self.injector
                .peers
                .set_last_fernet_rotation(context, now)
                .await?;
            slog::info!(context.logger, "Initialised missing fernet key ring");
            return Ok(true);
        }

        let rotation = ring.rotate(policy.max_active_keys)?;
        admin.write_fernet_keys(context, &ring).await?;
        self.injector
            .peers
            .set_last_fernet_rotation(context, now)
            .await?;
        ROTATIONS.inc();
        slog::info!(
            context.logger, "Rotated fernet keys";
            "promoted" => rotation.promoted,
            "retired" => ?rotation.retired,
            "active" => ring.len(),
        );
        Ok(true)
    }
}
