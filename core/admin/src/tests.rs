use idop_context::Context;
use idop_errors::AdminApiError;
use idop_errors::AlreadyExists;
use idop_fernet::KeyRing;

use super::AdminFixture;
use super::DomainSpec;
use super::EndpointSpec;
use super::IdentityAdmin;
use super::Interface;
use super::ProjectSpec;
use super::RoleSpec;
use super::ServiceSpec;
use super::UserSpec;

fn fixture() -> (IdentityAdmin, AdminFixture) {
    let backend = AdminFixture::default();
    (IdentityAdmin::from(backend.clone()), backend)
}

fn user_spec(domain_id: &str) -> UserSpec {
    UserSpec {
        domain_id: domain_id.into(),
        name: "svc_glance".into(),
        password: "s3cret".into(),
    }
}

#[tokio::test]
async fn get_or_create_creates_once() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    let spec = DomainSpec::named("service_domain");
    let first = admin.get_or_create_domain(&context, &spec, true).await.unwrap();
    let second = admin.get_or_create_domain(&context, &spec, true).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(backend.created("domain"), 1);
}

#[tokio::test]
async fn get_or_create_conflict() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    let spec = RoleSpec::named("Admin");
    admin.get_or_create_role(&context, &spec, false).await.unwrap();
    match admin.get_or_create_role(&context, &spec, false).await {
        Err(error) if error.is::<AlreadyExists>() => (),
        Err(error) => panic!("unexpected error: {:?}", error),
        Ok(_) => panic!("duplicate role was accepted"),
    }
    assert_eq!(backend.created("role"), 1);
}

#[tokio::test]
async fn projects_are_scoped_by_domain() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    let admin_project = ProjectSpec::named("admin", "domain-1");
    let other_project = ProjectSpec::named("admin", "domain-2");
    let first = admin
        .get_or_create_project(&context, &admin_project, true)
        .await
        .unwrap();
    let second = admin
        .get_or_create_project(&context, &other_project, true)
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(backend.created("project"), 2);
}

#[tokio::test]
async fn existing_user_keeps_password() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    admin
        .get_or_create_user(&context, &user_spec("default"), true)
        .await
        .unwrap();
    let mut spec = user_spec("default");
    spec.password = "changed".into();
    admin.get_or_create_user(&context, &spec, true).await.unwrap();
    assert_eq!(backend.password("svc_glance").as_deref(), Some("s3cret"));
    assert_eq!(backend.created("user"), 1);
}

#[tokio::test]
async fn grant_role_idempotent() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    let role = admin
        .get_or_create_role(&context, &RoleSpec::named("Admin"), true)
        .await
        .unwrap();
    let user = admin
        .get_or_create_user(&context, &user_spec("default"), true)
        .await
        .unwrap();
    let project = admin
        .get_or_create_project(&context, &ProjectSpec::named("services", "default"), true)
        .await
        .unwrap();

    admin.grant_role(&context, &role, &user, &project, true).await.unwrap();
    admin.grant_role(&context, &role, &user, &project, true).await.unwrap();
    assert_eq!(backend.created("role assignment"), 1);
    assert!(backend.granted("Admin", "svc_glance", "services"));

    match admin.grant_role(&context, &role, &user, &project, false).await {
        Err(error) if error.is::<AlreadyExists>() => (),
        Err(error) => panic!("unexpected error: {:?}", error),
        Ok(_) => panic!("duplicate grant was accepted"),
    }
}

#[tokio::test]
async fn services_match_name_and_type() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    let v2 = ServiceSpec {
        description: "Cinder Volume Service v2".into(),
        name: "cinder".into(),
        service_type: "volumev2".into(),
    };
    let v3 = ServiceSpec {
        service_type: "volumev3".into(),
        ..v2.clone()
    };
    admin.get_or_create_service(&context, &v2, true).await.unwrap();
    admin.get_or_create_service(&context, &v3, true).await.unwrap();
    admin.get_or_create_service(&context, &v3, true).await.unwrap();
    assert_eq!(backend.services().len(), 2);
}

#[tokio::test]
async fn endpoints_keep_existing_url() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    let mut spec = EndpointSpec {
        interface: Interface::Public,
        region: "RegionOne".into(),
        service_id: "service-1".into(),
        url: "http://10.0.0.1:9292".into(),
    };
    admin.get_or_create_endpoint(&context, &spec, true).await.unwrap();
    spec.url = "http://glance.example.com".into();
    let endpoint = admin.get_or_create_endpoint(&context, &spec, true).await.unwrap();
    assert_eq!(endpoint.url, "http://10.0.0.1:9292");
    assert_eq!(backend.created("endpoint"), 1);
}

#[tokio::test]
async fn sync_endpoint_url_updates() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    let mut spec = EndpointSpec {
        interface: Interface::Internal,
        region: "RegionOne".into(),
        service_id: "service-1".into(),
        url: "http://10.0.0.1:5000".into(),
    };
    admin.sync_endpoint_url(&context, &spec).await.unwrap();
    admin.sync_endpoint_url(&context, &spec).await.unwrap();
    assert_eq!(backend.writes(), 1);

    spec.url = "http://keystone.internal:5000".into();
    let endpoint = admin.sync_endpoint_url(&context, &spec).await.unwrap();
    assert_eq!(endpoint.url, "http://keystone.internal:5000");
    assert_eq!(backend.endpoints().len(), 1);
    assert_eq!(backend.writes(), 2);
}

#[tokio::test]
async fn remote_failures_carry_operation() {
    let context = Context::fixture();
    let (admin, backend) = fixture();
    backend.fail("create_user");
    let error = admin
        .get_or_create_user(&context, &user_spec("default"), true)
        .await
        .unwrap_err();
    let api_error = error.downcast_ref::<AdminApiError>().unwrap();
    assert_eq!(api_error.operation, "create_user");

    backend.heal();
    admin
        .get_or_create_user(&context, &user_spec("default"), true)
        .await
        .unwrap();
}

#[tokio::test]
async fn fernet_keys_round_trip() {
    let context = Context::fixture();
    let (admin, _) = fixture();
    assert!(admin.read_fernet_keys(&context).await.unwrap().is_empty());
    let ring = KeyRing::initial();
    admin.write_fernet_keys(&context, &ring).await.unwrap();
    assert_eq!(admin.read_fernet_keys(&context).await.unwrap(), ring);
}

#[tokio::test]
async fn default_domain_lookup() {
    let context = Context::fixture();
    let (admin, _) = fixture();
    let domain = admin.domain(&context, "default").await.unwrap().unwrap();
    assert_eq!(domain.name, "Default");
    assert_eq!(admin.domain(&context, "missing").await.unwrap(), None);
}
