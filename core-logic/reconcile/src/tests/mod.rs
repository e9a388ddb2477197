use idop_context::Context;
use idop_injector::Injector;
use idop_injector::InjectorFixture;
use idop_relations::RelationData;
use idop_relations::RelationRef;
use idop_relations::IDENTITY_CREDENTIALS;
use idop_relations::IDENTITY_SERVICE;

use crate::Engine;
use crate::Event;
use crate::Outcome;

mod consumers;
mod rotation;

/// Engine for a leader unit with a ready workload.
pub fn engine() -> (InjectorFixture, Engine) {
    let fixture = Injector::fixture();
    let engine = Engine::new(fixture.injector.clone());
    (fixture, engine)
}

/// Engine for a leader unit that completed bootstrap.
pub async fn bootstrapped() -> (InjectorFixture, Engine) {
    let (fixture, engine) = engine();
    let outcome = engine
        .handle(&Context::fixture(), Event::Bootstrap)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Handled);
    (fixture, engine)
}

pub fn cinder() -> RelationRef {
    RelationRef {
        app: "cinder".into(),
        id: 7,
        name: IDENTITY_SERVICE.into(),
    }
}

/// Identity service request advertising the block storage v2 and v3 APIs.
pub fn cinder_request() -> RelationData {
    let endpoints = serde_json::json!([
        {
            "service_name": "cinderv2",
            "type": "volumev2",
            "description": "Cinder Volume Service v2",
            "admin_url": "http://cinder.admin:8776/v2/$(tenant_id)s",
            "internal_url": "http://cinder.internal:8776/v2/$(tenant_id)s",
            "public_url": "http://cinder.public:8776/v2/$(tenant_id)s",
        },
        {
            "service_name": "cinderv3",
            "type": "volumev3",
            "description": "Cinder Volume Service v3",
            "admin_url": "http://cinder.admin:8776/v3/$(tenant_id)s",
            "internal_url": "http://cinder.internal:8776/v3/$(tenant_id)s",
            "public_url": "http://cinder.public:8776/v3/$(tenant_id)s",
        },
    ]);
    let mut data = RelationData::new();
    data.insert("region".into(), "RegionOne".into());
    data.insert("service-endpoints".into(), endpoints.to_string());
    data
}

pub fn exporter() -> RelationRef {
    RelationRef {
        app: "openstack-exporter".into(),
        id: 12,
        name: IDENTITY_CREDENTIALS.into(),
    }
}

pub fn exporter_request() -> RelationData {
    let mut data = RelationData::new();
    data.insert("username".into(), "exporter".into());
    data
}

/// Event announcing the cinder request, read from relation data.
pub fn cinder_ready() -> Event {
    Event::IdentityServiceReady {
        relation: cinder(),
        request: None,
    }
}
