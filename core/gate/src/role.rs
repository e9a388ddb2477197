//! Leadership of the unit within its application.
use std::sync::Arc;

use anyhow::Result;

use idop_context::Context;

/// Leadership of the unit within its application.
#[derive(Clone)]
pub struct ClusterRole(Arc<dyn ClusterRoleBackend>);

impl ClusterRole {
    /// Check if the unit is the application leader.
    pub async fn is_leader(&self, context: &Context) -> Result<bool> {
        self.0.is_leader(context).await
    }
}

impl<T> From<T> for ClusterRole
where
    T: ClusterRoleBackend + 'static,
{
    fn from(value: T) -> Self {
        ClusterRole(Arc::new(value))
    }
}

/// Operations implemented by leader election providers.
#[async_trait::async_trait]
pub trait ClusterRoleBackend: Send + Sync {
    /// Check if the unit is the application leader.
    async fn is_leader(&self, context: &Context) -> Result<bool>;
}

/// Leadership decided by the host runtime and passed to the process at start.
#[derive(Clone, Copy, Debug)]
pub struct StaticRole {
    leader: bool,
}

impl StaticRole {
    /// The unit is the application leader.
    pub fn leader() -> StaticRole {
        StaticRole { leader: true }
    }

    /// The unit is not the application leader.
    pub fn follower() -> StaticRole {
        StaticRole { leader: false }
    }
}

#[async_trait::async_trait]
impl ClusterRoleBackend for StaticRole {
    async fn is_leader(&self, _: &Context) -> Result<bool> {
        Ok(self.leader)
    }
}

#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::RoleFixture;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use anyhow::Result;

    use idop_context::Context;

    use super::ClusterRoleBackend;

    /// Leadership that unit tests can change at any time.
    #[derive(Clone)]
    pub struct RoleFixture(Arc<AtomicBool>);

    impl RoleFixture {
        /// Start as the application leader.
        pub fn leader() -> RoleFixture {
            RoleFixture(Arc::new(AtomicBool::new(true)))
        }

        /// Change the leadership of the unit.
        pub fn set_leader(&self, leader: bool) {
            self.0.store(leader, Ordering::Release);
        }
    }

    #[async_trait::async_trait]
    impl ClusterRoleBackend for RoleFixture {
        async fn is_leader(&self, _: &Context) -> Result<bool> {
            Ok(self.0.load(Ordering::Acquire))
        }
    }
}
