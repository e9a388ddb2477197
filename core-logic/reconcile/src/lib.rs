//! Reconcile operator events into identity service state.
//!
//! The [`Engine`] receives one event at a time, checks it against the [`Gate`]
//! and drives the identity admin client and password store to the state the event
//! requires. Every operation is idempotent: redelivered events never create
//! duplicate identity objects or regenerate credentials.
//!
//! [`Gate`]: idop_gate::Gate
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use idop_context::Context;
use idop_errors::AdminApiError;
use idop_errors::AlreadyExists;
use idop_gate::Admission;
use idop_gate::GateRejection;
use idop_gate::Requirement;
use idop_injector::Injector;
use idop_relations::CredentialsRequest;
use idop_relations::IdentityServiceRequest;
use idop_relations::InvalidRequest;
use idop_relations::RelationRef;
use idop_workload::ExecFailed;

mod actions;
mod bootstrap;
mod consumers;
mod credentials;
mod errors;
mod heartbeat;
mod lifecycle;
mod objects;
mod render;
mod rotation;
mod telemetry;
mod topology;

#[cfg(test)]
mod tests;

pub use self::actions::AdminAccount;
pub use self::actions::ServiceAccount;
pub use self::errors::BootstrapFailure;
pub use self::errors::InvalidTransition;
pub use self::errors::ReservedUsername;
pub use self::lifecycle::RequestState;
pub use self::telemetry::register_metrics;
pub use self::topology::Topology;

/// Name of the operator's own administrative user.
pub const CHARM_USER: &str = "_charm-keystone-admin";

/// Domain administrative users live in.
pub const ADMIN_DOMAIN: &str = "admin_domain";

/// Project administrative users are granted access to.
pub const ADMIN_PROJECT: &str = "admin";

/// ID of the builtin domain created by the identity service bootstrap.
pub const DEFAULT_DOMAIN_ID: &str = "default";

/// Domain service users live in.
pub const SERVICE_DOMAIN: &str = "service_domain";

/// Port the identity API listens on.
pub const SERVICE_PORT: u16 = 5000;

/// Events the operator reacts to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "event")]
pub enum Event {
    /// The workload started and the identity service must be bootstrapped.
    Bootstrap,

    /// Operator options changed.
    ConfigChanged,

    /// A consumer published (or changed) a cloud credentials request.
    CredentialsReady {
        relation: RelationRef,

        /// Request, read from the relation data when not included in the event.
        #[serde(default)]
        request: Option<CredentialsRequest>,
    },

    /// Periodic tick used to rotate fernet keys.
    Heartbeat,

    /// A consumer published (or changed) a catalog registration request.
    IdentityServiceReady {
        relation: RelationRef,

        /// Request, read from the relation data when not included in the event.
        #[serde(default)]
        request: Option<IdentityServiceRequest>,
    },

    /// The URLs the identity service is exposed at through ingress changed.
    ///
    /// Internal and public ingress change independently: an absent URL keeps the
    /// known value while an empty one removes it.
    IngressChanged {
        #[serde(default)]
        internal_url: Option<String>,

        #[serde(default)]
        public_url: Option<String>,
    },
}

impl Event {
    /// Short name of the event for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Bootstrap => "bootstrap",
            Event::ConfigChanged => "config-changed",
            Event::CredentialsReady { .. } => "credentials-ready",
            Event::Heartbeat => "heartbeat",
            Event::IdentityServiceReady { .. } => "identity-service-ready",
            Event::IngressChanged { .. } => "ingress-changed",
        }
    }

    /// Conditions the unit must meet before the event is handled.
    pub fn requirements(&self) -> &'static [Requirement] {
        match self {
            Event::Bootstrap => &[Requirement::Leader, Requirement::WorkloadReady],
            Event::ConfigChanged => &[Requirement::WorkloadReady],
            Event::CredentialsReady { .. } => &[
                Requirement::Leader,
                Requirement::WorkloadReady,
                Requirement::Bootstrapped,
            ],
            Event::Heartbeat => &[
                Requirement::Leader,
                Requirement::WorkloadReady,
                Requirement::Bootstrapped,
            ],
            Event::IdentityServiceReady { .. } => &[
                Requirement::Leader,
                Requirement::WorkloadReady,
                Requirement::Bootstrapped,
            ],
            Event::IngressChanged { .. } => &[Requirement::WorkloadReady],
        }
    }

    fn relation(&self) -> Option<&RelationRef> {
        match self {
            Event::CredentialsReady { relation, .. } => Some(relation),
            Event::IdentityServiceReady { relation, .. } => Some(relation),
            _ => None,
        }
    }
}

/// Result of handling an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The event was fully handled.
    Handled,

    /// The event was dropped without side effects.
    Rejected(GateRejection),

    /// The event must be delivered again later.
    DeferRetry(DeferReason),
}

/// Reason an event must be delivered again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeferReason {
    /// A precondition checked by the gate is not met yet.
    Gate(GateRejection),

    /// Handling failed in a way a later attempt may resolve.
    Failure(String),
}

/// Reconcile operator events into identity service state.
#[derive(Clone)]
pub struct Engine {
    injector: Injector,
}

impl Engine {
    /// Reconcile events using the given dependencies.
    pub fn new(injector: Injector) -> Engine {
        Engine { injector }
    }

    /// Handle an event and report how the host should proceed with it.
    ///
    /// Failures of the identity API, the workload or the bootstrap sequence defer the event.
    /// Conflicts and invalid requests are returned as errors as retrying cannot fix them.
    pub async fn handle(&self, context: &Context, event: Event) -> Result<Outcome> {
        let context = context.derive_with(|builder| {
            let builder = builder.log_values(slog::o!("event" => event.kind()));
            match event.relation() {
                Some(relation) => builder.log_values(slog::o!("relation" => relation.to_string())),
                None => builder,
            }
        });
        let mut lifecycle = event.relation().map(lifecycle::RequestLifecycle::new);

        let admission = self
            .injector
            .gate
            .check(&context, event.requirements())
            .await?;
        let outcome = match admission {
            Admission::Admit => None,
            Admission::Defer(rejection) => Some(Outcome::DeferRetry(DeferReason::Gate(rejection))),
            Admission::Reject(rejection) => Some(Outcome::Rejected(rejection)),
        };
        if let Some(outcome) = outcome {
            if let (Some(lifecycle), Outcome::DeferRetry(_)) = (lifecycle.as_mut(), &outcome) {
                lifecycle.transition(&context, RequestState::Deferred)?;
            }
            telemetry::observe(&event, &outcome);
            return Ok(outcome);
        }

        if let Some(lifecycle) = lifecycle.as_mut() {
            lifecycle.transition(&context, RequestState::Resolving)?;
        }
        let kind = event.kind();
        let result = self.dispatch(&context, event.clone()).await;
        let outcome = match result {
            Ok(()) => {
                if let Some(lifecycle) = lifecycle.as_mut() {
                    lifecycle.transition(&context, RequestState::Published)?;
                }
                Outcome::Handled
            }
            Err(error) if is_retryable(&error) => {
                slog::warn!(
                    context.logger, "Deferring event after failure";
                    "error" => format!("{:#}", error),
                );
                if let Some(lifecycle) = lifecycle.as_mut() {
                    lifecycle.transition(&context, RequestState::Deferred)?;
                }
                Outcome::DeferRetry(DeferReason::Failure(format!("{:#}", error)))
            }
            Err(error) => {
                telemetry::EVENT_ERR.with_label_values(&[kind]).inc();
                return Err(error);
            }
        };
        telemetry::observe(&event, &outcome);
        Ok(outcome)
    }

    /// Invoke the operation for an admitted event.
    async fn dispatch(&self, context: &Context, event: Event) -> Result<()> {
        match event {
            Event::Bootstrap => {
                self.configure(context).await?;
                if !self.injector.local.load(context).await?.bootstrapped {
                    self.bootstrap(context).await?;
                    self.configure(context).await?;
                }
                Ok(())
            }
            Event::ConfigChanged => {
                self.configure(context).await?;
                self.refresh_catalog_if_owner(context).await
            }
            Event::CredentialsReady { relation, request } => {
                let request = match request {
                    Some(request) => {
                        request.validate()?;
                        Some(request)
                    }
                    None => {
                        let data = self.injector.relations.remote_data(context, &relation).await?;
                        CredentialsRequest::from_data(&data)?
                    }
                };
                match request {
                    Some(request) => self.grant_credentials(context, &relation, &request).await,
                    None => {
                        slog::debug!(context.logger, "Credentials request is not complete yet");
                        Ok(())
                    }
                }
            }
            Event::Heartbeat => {
                self.rotate_fernet_keys(context).await?;
                Ok(())
            }
            Event::IdentityServiceReady { relation, request } => {
                let request = match request {
                    Some(request) => {
                        request.validate()?;
                        Some(request)
                    }
                    None => {
                        let data = self.injector.relations.remote_data(context, &relation).await?;
                        IdentityServiceRequest::from_data(&data)?
                    }
                };
                match request {
                    Some(request) => self.register_consumer(context, &relation, &request).await,
                    None => {
                        slog::debug!(context.logger, "Identity service request is not complete yet");
                        Ok(())
                    }
                }
            }
            Event::IngressChanged {
                internal_url,
                public_url,
            } => {
                self.injector
                    .local
                    .update(context, |state| {
                        if let Some(url) = internal_url {
                            state.ingress_internal_url = Some(url).filter(|url| !url.is_empty());
                        }
                        if let Some(url) = public_url {
                            state.ingress_public_url = Some(url).filter(|url| !url.is_empty());
                        }
                    })
                    .await?;
                self.refresh_catalog_if_owner(context).await?;
                self.configure(context).await
            }
        }
    }

    /// Update the service catalog when the unit is the bootstrapped leader.
    async fn refresh_catalog_if_owner(&self, context: &Context) -> Result<()> {
        let leader = self.injector.gate.is_leader(context).await?;
        let bootstrapped = self.injector.local.load(context).await?.bootstrapped;
        if leader && bootstrapped {
            self.update_service_catalog(context).await?;
        }
        Ok(())
    }
}

/// Check if a later attempt may succeed where this one failed.
fn is_retryable(error: &anyhow::Error) -> bool {
    if idop_errors::caused_by::<AlreadyExists>(error) || idop_errors::caused_by::<InvalidRequest>(error) {
        return false;
    }
    idop_errors::caused_by::<AdminApiError>(error)
        || idop_errors::caused_by::<BootstrapFailure>(error)
        || idop_errors::caused_by::<ExecFailed>(error)
}
