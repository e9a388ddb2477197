//! Drive fernet key rotation from the heartbeat.
use anyhow::Result;

use idop_context::Context;
use idop_heartbeat::HeartbeatCallback;

use crate::Engine;
use crate::Event;
use crate::Outcome;

#[async_trait::async_trait]
impl HeartbeatCallback for Engine {
    async fn beat(&self, context: &Context) -> Result<()> {
        // Deferred heartbeats are retried by the next tick.
        match self.handle(context, Event::Heartbeat).await? {
            Outcome::Handled => (),
            outcome => slog::debug!(
                context.logger, "Heartbeat not handled";
                "outcome" => ?outcome,
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use idop_context::Context;
    use idop_heartbeat::HeartbeatCallback;
    use time::Duration;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn beat_rotates_overdue_keys() {
        let context = Context::fixture();
        let (fixture, engine) = crate::tests::bootstrapped().await;
        engine.beat(&context).await.unwrap();
        assert_eq!(fixture.admin.keys().len(), 2);

        let overdue = OffsetDateTime::now_utc() - Duration::days(3);
        fixture
            .injector
            .peers
            .set_last_fernet_rotation(&context, overdue)
            .await
            .unwrap();
        engine.beat(&context).await.unwrap();
        assert_eq!(fixture.admin.keys().len(), 3);
    }

    #[tokio::test]
    async fn beat_before_bootstrap_is_ok() {
        let context = Context::fixture();
        let (fixture, engine) = crate::tests::engine();
        engine.beat(&context).await.unwrap();
        assert!(fixture.admin.keys().is_empty());
    }
}
