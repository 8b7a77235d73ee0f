//! Results returned by service capabilities.
//!
//! Provision, update and deprovision may complete asynchronously. Their
//! results implement [`AsyncCompletion`], which is how the router finds and
//! rewrites the operation marker without knowing the concrete verb.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Common view over results that may finish asynchronously.
pub trait AsyncCompletion {
    /// Whether the platform must poll `last_operation` for the outcome.
    fn is_async(&self) -> bool;

    /// The opaque operation marker returned to the platform.
    fn operation(&self) -> Option<&str>;

    /// Replaces the operation marker.
    fn set_operation(&mut self, operation: Option<String>);
}

// ---------------------------------------------------------------------------
// Provision
// ---------------------------------------------------------------------------

/// How a provision request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    /// A new instance was created synchronously.
    Created,
    /// An instance with the same id and attributes already exists.
    IdenticalAlreadyExists,
    /// Provisioning was accepted and continues in the background.
    Async,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedServiceSpec {
    pub state: ProvisionState,
    pub dashboard_url: Option<String>,
    pub operation: Option<String>,
}

impl ProvisionedServiceSpec {
    #[must_use]
    pub fn created() -> Self {
        Self {
            state: ProvisionState::Created,
            dashboard_url: None,
            operation: None,
        }
    }

    #[must_use]
    pub fn identical() -> Self {
        Self {
            state: ProvisionState::IdenticalAlreadyExists,
            ..Self::created()
        }
    }

    #[must_use]
    pub fn accepted(operation: Option<String>) -> Self {
        Self {
            state: ProvisionState::Async,
            dashboard_url: None,
            operation,
        }
    }

    #[must_use]
    pub fn with_dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.dashboard_url = Some(url.into());
        self
    }
}

impl AsyncCompletion for ProvisionedServiceSpec {
    fn is_async(&self) -> bool {
        self.state == ProvisionState::Async
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    fn set_operation(&mut self, operation: Option<String>) {
        self.operation = operation;
    }
}

// ---------------------------------------------------------------------------
// Update / deprovision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateServiceSpec {
    pub is_async: bool,
    pub dashboard_url: Option<String>,
    pub operation: Option<String>,
}

impl UpdateServiceSpec {
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn accepted(operation: Option<String>) -> Self {
        Self {
            is_async: true,
            dashboard_url: None,
            operation,
        }
    }
}

impl AsyncCompletion for UpdateServiceSpec {
    fn is_async(&self) -> bool {
        self.is_async
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    fn set_operation(&mut self, operation: Option<String>) {
        self.operation = operation;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeprovisionServiceSpec {
    pub is_async: bool,
    pub operation: Option<String>,
}

impl DeprovisionServiceSpec {
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn accepted(operation: Option<String>) -> Self {
        Self {
            is_async: true,
            operation,
        }
    }
}

impl AsyncCompletion for DeprovisionServiceSpec {
    fn is_async(&self) -> bool {
        self.is_async
    }

    fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    fn set_operation(&mut self, operation: Option<String>) {
        self.operation = operation;
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Opaque credentials handed to the bound application.
pub type Credentials = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Created,
    IdenticalAlreadyExists,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub state: BindState,
    pub credentials: Credentials,
    pub syslog_drain_url: Option<String>,
    pub route_service_url: Option<String>,
}

impl Binding {
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            state: BindState::Created,
            credentials,
            syslog_drain_url: None,
            route_service_url: None,
        }
    }

    #[must_use]
    pub fn identical(credentials: Credentials) -> Self {
        Self {
            state: BindState::IdenticalAlreadyExists,
            ..Self::new(credentials)
        }
    }
}

// ---------------------------------------------------------------------------
// Last operation
// ---------------------------------------------------------------------------

/// State of an asynchronous operation. `InProgress` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

impl OperationState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Body of a `last_operation` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperation {
    pub state: OperationState,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl LastOperation {
    #[must_use]
    pub fn new(state: OperationState, description: impl Into<String>) -> Self {
        Self {
            state,
            description: Some(description.into()),
        }
    }

    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            state: OperationState::Succeeded,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn provision_spec_async_only_when_accepted() {
        assert!(!ProvisionedServiceSpec::created().is_async());
        assert!(!ProvisionedServiceSpec::identical().is_async());
        assert!(ProvisionedServiceSpec::accepted(None).is_async());
    }

    #[test]
    fn set_operation_replaces_marker() {
        let mut spec = UpdateServiceSpec::accepted(Some("update".to_string()));
        spec.set_operation(Some("svc update".to_string()));
        assert_eq!(spec.operation(), Some("svc update"));
    }

    #[test]
    fn last_operation_uses_wire_state_names() {
        let op = LastOperation::new(OperationState::InProgress, "creating");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"state": "in progress", "description": "creating"})
        );
        assert_eq!(
            serde_json::to_value(LastOperation::succeeded()).unwrap(),
            json!({"state": "succeeded"})
        );
    }

    #[test]
    fn only_in_progress_is_non_terminal() {
        assert!(!OperationState::InProgress.is_terminal());
        assert!(OperationState::Succeeded.is_terminal());
        assert!(OperationState::Failed.is_terminal());
    }
}
