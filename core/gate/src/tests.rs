use idop_context::Context;
use idop_errors::NotLeader;
use idop_state::LocalState;
use idop_state::StateFixture;
use idop_workload::Workload;
use idop_workload::WorkloadFixture;

use super::Admission;
use super::ClusterRole;
use super::Gate;
use super::GateRejection;
use super::Requirement;
use super::RoleFixture;

const ALL: [Requirement; 3] = [
    Requirement::Bootstrapped,
    Requirement::WorkloadReady,
    Requirement::Leader,
];

struct Fixtures {
    gate: Gate,
    local: LocalState,
    role: RoleFixture,
    workload: WorkloadFixture,
}

impl Fixtures {
    fn new() -> Fixtures {
        let role = RoleFixture::leader();
        let workload = WorkloadFixture::default();
        let local = LocalState::from(StateFixture::default());
        let gate = Gate::new(
            ClusterRole::from(role.clone()),
            Workload::from(workload.clone()),
            local.clone(),
        );
        Fixtures {
            gate,
            local,
            role,
            workload,
        }
    }

    async fn bootstrapped(&self) {
        self.local
            .update(&Context::fixture(), |state| state.bootstrapped = true)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn admit_when_all_met() {
    let fixtures = Fixtures::new();
    fixtures.bootstrapped().await;
    let admission = fixtures.gate.check(&Context::fixture(), &ALL).await.unwrap();
    assert_eq!(admission, Admission::Admit);
}

#[tokio::test]
async fn admit_without_requirements() {
    let fixtures = Fixtures::new();
    fixtures.role.set_leader(false);
    fixtures.workload.set_ready(false);
    let admission = fixtures.gate.check(&Context::fixture(), &[]).await.unwrap();
    assert_eq!(admission, Admission::Admit);
}

#[tokio::test]
async fn defer_until_bootstrapped() {
    let fixtures = Fixtures::new();
    let admission = fixtures.gate.check(&Context::fixture(), &ALL).await.unwrap();
    assert_eq!(admission, Admission::Defer(GateRejection::NotBootstrapped));
}

#[tokio::test]
async fn defer_until_workload_ready() {
    let fixtures = Fixtures::new();
    fixtures.workload.set_ready(false);
    let admission = fixtures.gate.check(&Context::fixture(), &ALL).await.unwrap();
    assert_eq!(admission, Admission::Defer(GateRejection::WorkloadNotReady));
}

#[tokio::test]
async fn leader_checked_first() {
    let fixtures = Fixtures::new();
    fixtures.role.set_leader(false);
    fixtures.workload.set_ready(false);
    let admission = fixtures.gate.check(&Context::fixture(), &ALL).await.unwrap();
    assert_eq!(admission, Admission::Reject(GateRejection::NotLeader));
}

#[tokio::test]
async fn non_leader_allowed_when_not_required() {
    let fixtures = Fixtures::new();
    fixtures.role.set_leader(false);
    fixtures.bootstrapped().await;
    let requirements = [Requirement::WorkloadReady, Requirement::Bootstrapped];
    let admission = fixtures
        .gate
        .check(&Context::fixture(), &requirements)
        .await
        .unwrap();
    assert_eq!(admission, Admission::Admit);
}

#[test]
fn rejection_into_error() {
    let error = GateRejection::NotLeader.into_error();
    assert!(error.is::<NotLeader>());
    assert_eq!(GateRejection::NotLeader.kind(), "not-leader");
}
