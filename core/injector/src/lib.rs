//! Container of the dependencies operator logic works with.
use idop_admin::IdentityAdmin;
use idop_conf::Conf;
use idop_gate::Gate;
use idop_passwords::PasswordStore;
use idop_relations::Relations;
use idop_state::LocalState;
use idop_state::PeerState;
use idop_workload::Workload;

/// Container for the process dependencies injected into operator logic.
#[derive(Clone)]
pub struct Injector {
    /// Idempotent administration of identity objects.
    pub admin: IdentityAdmin,

    /// Process global configuration.
    pub conf: Conf,

    /// Guards deciding if events can be handled.
    pub gate: Gate,

    /// State private to the managed unit.
    pub local: LocalState,

    /// Credentials table kept in peer state.
    pub passwords: PasswordStore,

    /// State replicated across all units of the application.
    pub peers: PeerState,

    /// Relations established with consumer applications.
    pub relations: Relations,

    /// Workload container running the identity service.
    pub workload: Workload,
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::InjectorFixture;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use idop_admin::AdminFixture;
    use idop_admin::IdentityAdmin;
    use idop_conf::Conf;
    use idop_gate::ClusterRole;
    use idop_gate::Gate;
    use idop_gate::RoleFixture;
    use idop_passwords::PasswordStore;
    use idop_passwords::SequencePasswords;
    use idop_relations::Relations;
    use idop_relations::RelationsFixture;
    use idop_state::LocalState;
    use idop_state::PeerState;
    use idop_state::StateFixture;
    use idop_workload::Workload;
    use idop_workload::WorkloadFixture;

    use super::Injector;

    /// [`Injector`] for unit tests along with handles to inspect and control its fixtures.
    #[derive(Clone)]
    pub struct InjectorFixture {
        pub admin: AdminFixture,
        pub injector: Injector,
        pub local: StateFixture,
        pub passwords: SequencePasswords,
        pub peers: StateFixture,
        pub relations: RelationsFixture,
        pub role: RoleFixture,
        pub workload: WorkloadFixture,
    }

    impl Injector {
        /// [`Injector`] instance to be used with unit tests.
        ///
        /// The unit starts as the leader of the application with a ready workload.
        pub fn fixture() -> InjectorFixture {
            let admin = AdminFixture::default();
            let local = StateFixture::default();
            let passwords = SequencePasswords::default();
            let peers = StateFixture::default();
            let relations = RelationsFixture::default();
            let role = RoleFixture::leader();
            let workload = WorkloadFixture::default();

            let local_state = LocalState::from(local.clone());
            let peer_state = PeerState::from(peers.clone());
            let workload_handle = Workload::from(workload.clone());
            let gate = Gate::new(
                ClusterRole::from(role.clone()),
                workload_handle.clone(),
                local_state.clone(),
            );
            let injector = Injector {
                admin: IdentityAdmin::from(admin.clone()),
                conf: Conf::default(),
                gate,
                local: local_state,
                passwords: PasswordStore::new(peer_state.clone(), passwords.clone()),
                peers: peer_state,
                relations: Relations::from(relations.clone()),
                workload: workload_handle,
            };
            InjectorFixture {
                admin,
                injector,
                local,
                passwords,
                peers,
                relations,
                role,
                workload,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use idop_context::Context;

    use super::Injector;

    #[tokio::test]
    async fn clones_share_backends() {
        let context = Context::fixture();
        let fixture = Injector::fixture();
        let engine_copy = fixture.injector.clone();
        engine_copy
            .peers
            .set(&context, "key", "value".to_string())
            .await
            .unwrap();
        let value = fixture.injector.peers.get(&context, "key").await.unwrap();
        assert_eq!(value.as_deref(), Some("value"));
    }
}
