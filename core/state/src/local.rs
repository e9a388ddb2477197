//! State private to the unit managed by the operator process.
use std::sync::Arc;

use anyhow::Context as AnyContext;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use idop_context::Context;

use crate::InvalidStateValue;
use crate::StateBackend;

/// Local key storing the [`UnitState`] document.
const UNIT_STATE: &str = "unit-state";

/// State private to the unit managed by the operator process.
#[derive(Clone)]
pub struct LocalState(Arc<dyn StateBackend>);

impl LocalState {
    /// Load the unit state, or its default if none was saved yet.
    pub async fn load(&self, context: &Context) -> Result<UnitState> {
        let value = match self.0.get(context, UNIT_STATE).await? {
            None => return Ok(UnitState::default()),
            Some(value) => value,
        };
        let state = serde_json::from_str(&value).context(InvalidStateValue::new(UNIT_STATE))?;
        Ok(state)
    }

    /// Persist the unit state.
    pub async fn save(&self, context: &Context, state: &UnitState) -> Result<()> {
        let value = serde_json::to_string(state)?;
        self.0.set(context, UNIT_STATE, value).await
    }

    /// Load the unit state, apply changes to it and persist the result.
    pub async fn update<F>(&self, context: &Context, callback: F) -> Result<UnitState>
    where
        F: FnOnce(&mut UnitState),
    {
        let mut state = self.load(context).await?;
        callback(&mut state);
        self.save(context, &state).await?;
        Ok(state)
    }
}

impl<T> From<T> for LocalState
where
    T: StateBackend + 'static,
{
    fn from(value: T) -> Self {
        LocalState(Arc::new(value))
    }
}

/// Information the operator tracks about the unit and the identity service it manages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    /// ID of the domain administrative users live in.
    #[serde(default)]
    pub admin_domain_id: Option<String>,

    /// Name of the domain administrative users live in.
    #[serde(default = "UnitState::default_admin_domain_name")]
    pub admin_domain_name: String,

    /// The bootstrap sequence completed successfully.
    #[serde(default)]
    pub bootstrapped: bool,

    /// ID of the builtin default domain.
    #[serde(default)]
    pub default_domain_id: Option<String>,

    /// URL of the internal ingress, when one is provided.
    #[serde(default)]
    pub ingress_internal_url: Option<String>,

    /// URL of the public ingress, when one is provided.
    #[serde(default)]
    pub ingress_public_url: Option<String>,

    /// ID of the domain service users live in.
    #[serde(default)]
    pub service_domain_id: Option<String>,

    /// ID of the project service users are granted access to.
    #[serde(default)]
    pub service_project_id: Option<String>,

    /// Status of the unit as reported to the deployment tooling.
    #[serde(default)]
    pub status: UnitStatus,
}

impl UnitState {
    fn default_admin_domain_name() -> String {
        "admin_domain".into()
    }
}

impl Default for UnitState {
    fn default() -> Self {
        UnitState {
            admin_domain_id: None,
            admin_domain_name: Self::default_admin_domain_name(),
            bootstrapped: false,
            default_domain_id: None,
            ingress_internal_url: None,
            ingress_public_url: None,
            service_domain_id: None,
            service_project_id: None,
            status: UnitStatus::default(),
        }
    }
}

/// Status of the unit as reported to the deployment tooling.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "message")]
pub enum UnitStatus {
    /// The unit is operating normally.
    Active,

    /// The unit needs attention before it can operate.
    Blocked(String),

    /// The unit is performing maintenance operations.
    Maintenance(String),

    /// The unit status was never reported.
    #[default]
    Unknown,

    /// The unit is waiting on something outside of its control.
    Waiting(String),
}

#[cfg(test)]
mod tests {
    use idop_context::Context;

    use super::LocalState;
    use super::UnitState;
    use super::UnitStatus;
    use crate::InvalidStateValue;
    use crate::StateBackend;
    use crate::StateFixture;

    #[tokio::test]
    async fn load_default() {
        let local = LocalState::from(StateFixture::default());
        let state = local.load(&Context::fixture()).await.unwrap();
        assert_eq!(state, UnitState::default());
        assert_eq!(state.admin_domain_name, "admin_domain");
        assert!(!state.bootstrapped);
    }

    #[tokio::test]
    async fn load_invalid() {
        let context = Context::fixture();
        let backend = StateFixture::default();
        backend
            .set(&context, "unit-state", "{not json".into())
            .await
            .unwrap();
        let local = LocalState::from(backend);
        match local.load(&context).await {
            Err(error) if error.is::<InvalidStateValue>() => (),
            Err(error) => panic!("unexpected error: {:?}", error),
            Ok(_) => panic!("invalid state was decoded"),
        }
    }

    #[tokio::test]
    async fn update_persists() {
        let context = Context::fixture();
        let backend = StateFixture::default();
        let local = LocalState::from(backend.clone());
        local
            .update(&context, |state| {
                state.bootstrapped = true;
                state.status = UnitStatus::Blocked("bootstrap failed".into());
            })
            .await
            .unwrap();

        let raw = backend.get(&context, "unit-state").await.unwrap().unwrap();
        assert!(raw.contains(r#""status":{"status":"blocked","message":"bootstrap failed"}"#));
        let state = local.load(&context).await.unwrap();
        assert!(state.bootstrapped);
    }
}
