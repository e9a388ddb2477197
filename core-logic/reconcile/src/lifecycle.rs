//! Track the state of a relation request while its event is handled.
use std::fmt;

use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use idop_context::Context;
use idop_relations::RelationRef;

use crate::telemetry::REQUEST_TRANSITIONS;
use crate::InvalidTransition;

/// State of a relation request within a single event delivery.
///
/// Every delivery starts at [`RequestState::Pending`]. Requests end at
/// [`RequestState::Published`] once relation data is written, at [`RequestState::Deferred`]
/// when the event must be delivered again, or stay [`RequestState::Pending`] when the
/// event is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestState {
    Deferred,
    Pending,
    Published,
    Resolving,
}

impl RequestState {
    /// Check if a request can move from this state to the given one.
    pub fn can_become(self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (RequestState::Pending, RequestState::Deferred)
                | (RequestState::Pending, RequestState::Resolving)
                | (RequestState::Resolving, RequestState::Deferred)
                | (RequestState::Resolving, RequestState::Published)
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            RequestState::Deferred => "deferred",
            RequestState::Pending => "pending",
            RequestState::Published => "published",
            RequestState::Resolving => "resolving",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the request carried by the event being handled.
pub(crate) struct RequestLifecycle {
    relation: String,
    state: RequestState,
}

impl RequestLifecycle {
    pub fn new(relation: &RelationRef) -> RequestLifecycle {
        RequestLifecycle {
            relation: relation.to_string(),
            state: RequestState::Pending,
        }
    }

    /// Move the request to a new state.
    pub fn transition(&mut self, context: &Context, next: RequestState) -> Result<()> {
        if !self.state.can_become(next) {
            anyhow::bail!(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        slog::debug!(
            context.logger, "Relation request changed state";
            "relation" => &self.relation,
            "from" => self.state.as_str(),
            "to" => next.as_str(),
        );
        REQUEST_TRANSITIONS
            .with_label_values(&[next.as_str()])
            .inc();
        self.state = next;
        Ok(())
    }

    #[cfg(test)]
    pub fn state(&self) -> RequestState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use idop_context::Context;
    use idop_relations::RelationRef;

    use super::RequestLifecycle;
    use super::RequestState;
    use crate::InvalidTransition;

    fn relation() -> RelationRef {
        RelationRef {
            app: "cinder".into(),
            id: 4,
            name: "identity-service".into(),
        }
    }

    #[test]
    fn published_after_resolving() {
        let context = Context::fixture();
        let mut lifecycle = RequestLifecycle::new(&relation());
        assert_eq!(lifecycle.state(), RequestState::Pending);
        lifecycle
            .transition(&context, RequestState::Resolving)
            .unwrap();
        lifecycle
            .transition(&context, RequestState::Published)
            .unwrap();
        assert_eq!(lifecycle.state(), RequestState::Published);
    }

    #[test]
    fn deferred_from_pending_or_resolving() {
        assert!(RequestState::Pending.can_become(RequestState::Deferred));
        assert!(RequestState::Resolving.can_become(RequestState::Deferred));
        assert!(!RequestState::Published.can_become(RequestState::Deferred));
    }

    #[test]
    fn publish_requires_resolving() {
        let context = Context::fixture();
        let mut lifecycle = RequestLifecycle::new(&relation());
        match lifecycle.transition(&context, RequestState::Published) {
            Err(error) if error.is::<InvalidTransition>() => (),
            Err(error) => panic!("unexpected error: {:?}", error),
            Ok(_) => panic!("request should not publish from pending"),
        }
        assert_eq!(lifecycle.state(), RequestState::Pending);
    }
}
