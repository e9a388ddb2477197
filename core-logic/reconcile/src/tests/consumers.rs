use idop_context::Context;
use idop_gate::GateRejection;
use idop_relations::IdentityServiceRequest;
use idop_relations::InvalidRequest;
use idop_relations::RelationData;

use super::bootstrapped;
use super::cinder;
use super::cinder_ready;
use super::cinder_request;
use super::engine;
use crate::DeferReason;
use crate::Event;
use crate::Outcome;

#[tokio::test]
async fn register_volume_services() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    fixture.relations.add(cinder(), cinder_request());

    let outcome = engine.handle(&context, cinder_ready()).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);

    let services = fixture.admin.services();
    let volumes: Vec<_> = services
        .iter()
        .filter(|service| service.service_type.starts_with("volume"))
        .collect();
    assert_eq!(volumes.len(), 2);
    let endpoints: Vec<_> = fixture
        .admin
        .endpoints()
        .into_iter()
        .filter(|endpoint| volumes.iter().any(|service| service.id == endpoint.service_id))
        .collect();
    assert_eq!(endpoints.len(), 6);
    assert!(endpoints.iter().all(|endpoint| endpoint.region == "RegionOne"));

    assert_eq!(fixture.relations.publish_count(&cinder()), 1);
    assert!(fixture.admin.granted("Admin", "svc_cinder", "services"));
}

#[tokio::test]
async fn register_publishes_bundle() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    fixture.relations.add(cinder(), cinder_request());
    engine.handle(&context, cinder_ready()).await.unwrap();

    let data = fixture.relations.published(&cinder()).unwrap();
    let password = fixture
        .injector
        .passwords
        .retrieve(&context, "svc:service_domain/svc_cinder")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(data["api-version"], "v3");
    assert_eq!(data["auth-host"], "127.0.0.1");
    assert_eq!(data["auth-port"], "5000");
    assert_eq!(data["service-protocol"], "http");
    assert_eq!(data["public-auth-url"], "http://127.0.0.1:5000");
    assert_eq!(data["admin-user-name"], "admin");
    assert_eq!(data["admin-domain-name"], "admin_domain");
    assert_eq!(data["service-user-name"], "svc_cinder");
    assert_eq!(data["service-project-name"], "services");
    assert_eq!(data["service-domain-name"], "service_domain");
    assert_eq!(data["service-password"], password);
    assert_eq!(fixture.admin.password("svc_cinder"), Some(password));
}

#[tokio::test]
async fn register_replay_converges() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    fixture.relations.add(cinder(), cinder_request());

    engine.handle(&context, cinder_ready()).await.unwrap();
    let first = fixture.relations.published(&cinder()).unwrap();
    let writes = fixture.admin.writes();
    let generated = fixture.passwords.generated();

    let outcome = engine.handle(&context, cinder_ready()).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(fixture.relations.published(&cinder()).unwrap(), first);
    assert_eq!(fixture.admin.writes(), writes);
    assert_eq!(fixture.passwords.generated(), generated);
    assert_eq!(fixture.admin.created("user"), 2);
}

#[tokio::test]
async fn register_with_inline_request() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    let request = IdentityServiceRequest::from_data(&cinder_request())
        .unwrap()
        .unwrap();
    let event = Event::IdentityServiceReady {
        relation: cinder(),
        request: Some(request),
    };

    let outcome = engine.handle(&context, event).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(fixture.relations.publish_count(&cinder()), 1);
}

#[tokio::test]
async fn register_rejects_inline_request_without_region() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    let mut request = IdentityServiceRequest::from_data(&cinder_request())
        .unwrap()
        .unwrap();
    request.region = String::new();
    let event = Event::IdentityServiceReady {
        relation: cinder(),
        request: Some(request),
    };

    match engine.handle(&context, event).await {
        Err(error) if error.is::<InvalidRequest>() => (),
        Err(error) => panic!("unexpected error: {:?}", error),
        Ok(outcome) => panic!("unexpected outcome: {:?}", outcome),
    }
    assert_eq!(fixture.relations.publish_count(&cinder()), 0);
}

#[tokio::test]
async fn register_before_bootstrap_defers() {
    let context = Context::fixture();
    let (fixture, engine) = engine();
    fixture.relations.add(cinder(), cinder_request());

    let outcome = engine.handle(&context, cinder_ready()).await.unwrap();
    assert_eq!(
        outcome,
        Outcome::DeferRetry(DeferReason::Gate(GateRejection::NotBootstrapped)),
    );
    assert_eq!(fixture.relations.publish_count(&cinder()), 0);
    assert_eq!(fixture.admin.writes(), 0);
}

#[tokio::test]
async fn register_on_follower_is_dropped() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    fixture.relations.add(cinder(), cinder_request());
    fixture.role.set_leader(false);
    let writes = fixture.admin.writes();

    let outcome = engine.handle(&context, cinder_ready()).await.unwrap();
    assert_eq!(outcome, Outcome::Rejected(GateRejection::NotLeader));
    assert_eq!(fixture.admin.writes(), writes);
    assert_eq!(fixture.relations.publish_count(&cinder()), 0);
}

#[tokio::test]
async fn register_incomplete_request_waits() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    let mut data = RelationData::new();
    data.insert("region".into(), "RegionOne".into());
    fixture.relations.add(cinder(), data);

    let outcome = engine.handle(&context, cinder_ready()).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(fixture.relations.publish_count(&cinder()), 0);
}

#[tokio::test]
async fn register_invalid_request_fails() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    let mut data = cinder_request();
    data.insert("service-endpoints".into(), "not json".into());
    fixture.relations.add(cinder(), data);

    match engine.handle(&context, cinder_ready()).await {
        Err(error) if idop_errors::caused_by::<InvalidRequest>(&error) => (),
        Err(error) => panic!("unexpected error: {:?}", error),
        Ok(outcome) => panic!("unexpected outcome: {:?}", outcome),
    }
}

#[tokio::test]
async fn register_admin_failure_defers() {
    let context = Context::fixture();
    let (fixture, engine) = bootstrapped().await;
    fixture.relations.add(cinder(), cinder_request());
    fixture.admin.fail("create_service");

    let outcome = engine.handle(&context, cinder_ready()).await.unwrap();
    assert!(matches!(outcome, Outcome::DeferRetry(DeferReason::Failure(_))));
    assert_eq!(fixture.relations.publish_count(&cinder()), 0);

    fixture.admin.heal();
    let outcome = engine.handle(&context, cinder_ready()).await.unwrap();
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(fixture.relations.publish_count(&cinder()), 1);
    assert_eq!(fixture.admin.created("user"), 2);
}
