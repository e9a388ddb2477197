use std::sync::atomic::AtomicU16;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use idop_context::Context;

use super::Heartbeat;
use super::HeartbeatCallback;

/// Heartbeat callback that counts its invocations and can fail.
#[derive(Clone, Default)]
struct Counter {
    count: Arc<AtomicU16>,
    fail: bool,
}

impl Counter {
    fn failing() -> Counter {
        Counter {
            count: Default::default(),
            fail: true,
        }
    }

    fn count(&self) -> u16 {
        self.count.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl HeartbeatCallback for Counter {
    async fn beat(&self, _: &Context) -> Result<()> {
        self.count.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            anyhow::bail!("test error");
        }
        Ok(())
    }
}

/// Heartbeat callback that takes a while to complete.
#[derive(Clone)]
struct Slow {
    completed: Arc<AtomicU16>,
    delay: Duration,
}

impl Slow {
    fn new(delay: Duration) -> Slow {
        Slow {
            completed: Default::default(),
            delay,
        }
    }

    fn completed(&self) -> u16 {
        self.completed.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl HeartbeatCallback for Slow {
    async fn beat(&self, _: &Context) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[test]
fn interval_clamped_to_limit() {
    let context = Context::fixture();
    let heartbeat = Heartbeat::new(&context, Duration::from_secs(600), Duration::from_secs(60));
    assert_eq!(heartbeat.interval(), Duration::from_secs(60));
}

#[test]
fn interval_within_limit() {
    let context = Context::fixture();
    let heartbeat = Heartbeat::new(&context, Duration::from_secs(30), Duration::from_secs(60));
    assert_eq!(heartbeat.interval(), Duration::from_secs(30));
}

#[test]
fn interval_never_zero() {
    let context = Context::fixture();
    let heartbeat = Heartbeat::new(&context, Duration::ZERO, Duration::from_secs(60));
    assert_eq!(heartbeat.interval(), super::MIN_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn beats_until_exit() {
    let context = Context::fixture();
    let counter = Counter::default();
    let heartbeat = Heartbeat::new(&context, Duration::from_secs(10), Duration::from_secs(60));
    let exit = tokio::time::sleep(Duration::from_secs(35));

    heartbeat.run(&context, &counter, exit).await;
    assert_eq!(counter.count(), 4);
}

#[tokio::test(start_paused = true)]
async fn errors_do_not_stop_the_loop() {
    let context = Context::fixture();
    let counter = Counter::failing();
    let heartbeat = Heartbeat::new(&context, Duration::from_secs(10), Duration::from_secs(60));
    let exit = tokio::time::sleep(Duration::from_secs(25));

    heartbeat.run(&context, &counter, exit).await;
    assert_eq!(counter.count(), 3);
}

#[tokio::test(start_paused = true)]
async fn exit_waits_for_beat_within_grace() {
    let context = Context::fixture();
    let slow = Slow::new(Duration::from_secs(5));
    let heartbeat = Heartbeat::new(&context, Duration::from_secs(10), Duration::from_secs(60))
        .with_grace(Duration::from_secs(10));
    let exit = tokio::time::sleep(Duration::from_secs(2));

    let start = tokio::time::Instant::now();
    heartbeat.run(&context, &slow, exit).await;
    assert_eq!(slow.completed(), 1);
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn exit_abandons_beat_after_grace() {
    let context = Context::fixture();
    let slow = Slow::new(Duration::from_secs(60));
    let heartbeat = Heartbeat::new(&context, Duration::from_secs(10), Duration::from_secs(60))
        .with_grace(Duration::from_secs(5));
    let exit = tokio::time::sleep(Duration::from_secs(2));

    let start = tokio::time::Instant::now();
    heartbeat.run(&context, &slow, exit).await;
    assert_eq!(slow.completed(), 0);
    assert_eq!(start.elapsed(), Duration::from_secs(7));
}

#[test]
fn grace_defaults_and_overrides() {
    let context = Context::fixture();
    let heartbeat = Heartbeat::new(&context, Duration::from_secs(10), Duration::from_secs(60));
    assert_eq!(heartbeat.grace(), super::DEFAULT_SHUTDOWN_GRACE);
    let heartbeat = heartbeat.with_grace(Duration::from_secs(3));
    assert_eq!(heartbeat.grace(), Duration::from_secs(3));
}
