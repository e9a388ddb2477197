//! Guards deciding if the identity operator can act on an event.
//!
//! Requirements are always evaluated in the same order regardless of how they are listed:
//!
//! 1. [`Requirement::Leader`]: non-leader units drop the event without side effects.
//! 2. [`Requirement::WorkloadReady`]: the event is deferred until the workload is ready.
//! 3. [`Requirement::Bootstrapped`]: the event is deferred until bootstrap completes.
use anyhow::Result;

use idop_context::Context;
use idop_errors::NotBootstrapped;
use idop_errors::NotLeader;
use idop_errors::WorkloadNotReady;
use idop_state::LocalState;
use idop_workload::Workload;

mod role;

pub use self::role::ClusterRole;
pub use self::role::ClusterRoleBackend;
pub use self::role::StaticRole;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::role::RoleFixture;

#[cfg(test)]
mod tests;

/// Conditions an event handler can require before acting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Requirement {
    /// The unit is the application leader.
    Leader,

    /// The workload container accepts commands.
    WorkloadReady,

    /// The identity service completed the bootstrap sequence.
    Bootstrapped,
}

/// Reason an event was not admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GateRejection {
    /// The identity service has not completed bootstrap.
    #[error("the identity service has not been bootstrapped yet")]
    NotBootstrapped,

    /// The unit is not the application leader.
    #[error("the event can only be handled by the leader unit")]
    NotLeader,

    /// The workload container does not accept commands yet.
    #[error("the workload container is not ready to accept commands")]
    WorkloadNotReady,
}

impl GateRejection {
    /// Convert the rejection into the matching shared error.
    pub fn into_error(self) -> anyhow::Error {
        match self {
            GateRejection::NotBootstrapped => anyhow::anyhow!(NotBootstrapped),
            GateRejection::NotLeader => anyhow::anyhow!(NotLeader),
            GateRejection::WorkloadNotReady => anyhow::anyhow!(WorkloadNotReady),
        }
    }

    /// Short name of the rejection for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GateRejection::NotBootstrapped => "not-bootstrapped",
            GateRejection::NotLeader => "not-leader",
            GateRejection::WorkloadNotReady => "workload-not-ready",
        }
    }
}

/// Decision taken by the [`Gate`] about an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// All requirements are met: handle the event.
    Admit,

    /// The event must be deferred and delivered again later.
    Defer(GateRejection),

    /// The event must be dropped without side effects.
    Reject(GateRejection),
}

/// Evaluate event requirements against the current state of the unit.
#[derive(Clone)]
pub struct Gate {
    local: LocalState,
    role: ClusterRole,
    workload: Workload,
}

impl Gate {
    /// Evaluate requirements using the given unit capabilities.
    pub fn new(role: ClusterRole, workload: Workload, local: LocalState) -> Gate {
        Gate {
            local,
            role,
            workload,
        }
    }

    /// Decide if an event with the given requirements can be handled now.
    pub async fn check(&self, context: &Context, requirements: &[Requirement]) -> Result<Admission> {
        let mut requirements = requirements.to_vec();
        requirements.sort();
        requirements.dedup();

        for requirement in requirements {
            let admission = match requirement {
                Requirement::Leader if !self.role.is_leader(context).await? => {
                    Admission::Reject(GateRejection::NotLeader)
                }
                Requirement::WorkloadReady if !self.workload.ready(context).await? => {
                    Admission::Defer(GateRejection::WorkloadNotReady)
                }
                Requirement::Bootstrapped if !self.local.load(context).await?.bootstrapped => {
                    Admission::Defer(GateRejection::NotBootstrapped)
                }
                _ => continue,
            };
            slog::debug!(
                context.logger, "Event not admitted";
                "admission" => ?admission,
            );
            return Ok(admission);
        }
        Ok(Admission::Admit)
    }

    /// Check if the unit is the application leader.
    pub async fn is_leader(&self, context: &Context) -> Result<bool> {
        self.role.is_leader(context).await
    }
}
