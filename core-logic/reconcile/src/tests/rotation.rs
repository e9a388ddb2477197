use idop_context::Context;
use idop_gate::GateRejection;
use time::Duration;
use time::OffsetDateTime;

use super::bootstrapped;
use super::engine;
use crate::Event;
use crate::Outcome;

fn indexes(fixture: &idop_injector::InjectorFixture) -> Vec<u32> {
    fixture.admin.keys().iter().map(|(index, _)| index).collect()
}

fn start() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()
}

/// Time of the last recorded rotation.
async fn last_rotation(fixture: &idop_injector::InjectorFixture) -> OffsetDateTime {
    fixture
        .injector
        .peers
        .last_fernet_rotation(&Context::fixture())
        .await
        .unwrap()
        .expect("no rotation recorded")
}

/// Interval between rotations with the default options.
fn interval() -> Duration {
    Duration::seconds(172800)
}

#[tokio::test]
async fn bootstrap_delays_first_rotation() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    let initialised = last_rotation(&fixture).await;
    let keys = fixture.admin.keys();

    let soon = initialised + Duration::hours(1);
    assert!(!engine.rotate_fernet_keys_at(&context, soon).await.unwrap());
    assert_eq!(fixture.admin.keys(), keys);
}

#[tokio::test]
async fn rotate_at_most_once_per_interval() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    assert_eq!(indexes(&fixture), vec![0, 1]);

    let first = last_rotation(&fixture).await + interval();
    assert!(engine.rotate_fernet_keys_at(&context, first).await.unwrap());
    assert_eq!(indexes(&fixture), vec![0, 1, 2]);
    let keys = fixture.admin.keys();

    let soon = first + Duration::hours(1);
    assert!(!engine.rotate_fernet_keys_at(&context, soon).await.unwrap());
    assert_eq!(fixture.admin.keys(), keys);
}

#[tokio::test]
async fn rotate_after_interval_retires_oldest() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    let first = last_rotation(&fixture).await + interval();
    engine.rotate_fernet_keys_at(&context, first).await.unwrap();
    let primary = fixture.admin.keys().get(2).cloned();
    let staged = fixture.admin.keys().get(0).cloned();

    let later = first + interval();
    assert!(engine.rotate_fernet_keys_at(&context, later).await.unwrap());
    let keys = fixture.admin.keys();
    assert_eq!(indexes(&fixture), vec![0, 2, 3]);
    assert_eq!(keys.get(2).cloned(), primary);
    assert_eq!(keys.get(3).cloned(), staged);

    let last = fixture
        .injector
        .peers
        .last_fernet_rotation(&context)
        .await
        .unwrap();
    assert_eq!(last, Some(later));
}

#[tokio::test]
async fn rotate_policy_from_options() {
    let (mut fixture, _) = engine();
    fixture.injector.conf.options.fernet_max_active_keys = 5;
    let engine = crate::Engine::new(fixture.injector.clone());
    assert_eq!(
        engine.rotation_policy().interval(),
        std::time::Duration::from_secs(57600),
    );
}

#[tokio::test]
async fn rotate_initialises_missing_ring() {
    let context = Context::fixture();
    let (fixture, engine) = engine();
    assert!(engine.rotate_fernet_keys_at(&context, start()).await.unwrap());
    assert_eq!(indexes(&fixture), vec![0, 1]);
}

#[tokio::test]
async fn heartbeat_rotates_keys() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;

    let outcome = engine.handle(&context, Event::Heartbeat).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(fixture.admin.keys().len(), 2);

    let overdue = OffsetDateTime::now_utc() - interval() - Duration::hours(1);
    fixture
        .injector
        .peers
        .set_last_fernet_rotation(&context, overdue)
        .await
        .unwrap();
    let outcome = engine.handle(&context, Event::Heartbeat).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(fixture.admin.keys().len(), 3);
    let last = last_rotation(&fixture).await;
    assert!(last > overdue);

    let outcome = engine.handle(&context, Event::Heartbeat).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(fixture.admin.keys().len(), 3);
}

#[tokio::test]
async fn heartbeat_on_follower_is_dropped() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    fixture.role.set_leader(false);
    let keys = fixture.admin.keys();

    let outcome = engine.handle(&context, Event::Heartbeat).await.unwrap();
    assert_eq!(outcome, Outcome::Rejected(GateRejection::NotLeader));
    assert_eq!(fixture.admin.keys(), keys);
}
