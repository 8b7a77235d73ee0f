//! Request details for each broker verb.
//!
//! These are the already-parsed request bodies (or query strings, for the
//! DELETE verbs) handed to the router by the transport layer.

use serde::{Deserialize, Serialize};

/// Arbitrary user-supplied parameters. Only delegates interpret them.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Body of a provision request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionDetails {
    pub service_id: String,
    pub plan_id: String,
    #[serde(default)]
    pub organization_guid: String,
    #[serde(default)]
    pub space_guid: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameters: Option<Parameters>,
    /// Platform-specific context object, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub context: Option<serde_json::Value>,
}

impl ProvisionDetails {
    #[must_use]
    pub fn new(service_id: impl Into<String>, plan_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            plan_id: plan_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Looks up a single parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&serde_json::Value> {
        self.parameters.as_ref().and_then(|params| params.get(name))
    }
}

/// Values of the instance before an update, as known by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousValues {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub service_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub space_id: Option<String>,
}

/// Body of an update request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub service_id: String,
    /// New plan; absent when only parameters change.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub plan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous_values: Option<PreviousValues>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameters: Option<Parameters>,
}

impl UpdateDetails {
    /// Plan the instance was on before this update, if the platform said so.
    #[must_use]
    pub fn previous_plan_id(&self) -> Option<&str> {
        self.previous_values
            .as_ref()
            .and_then(|prev| prev.plan_id.as_deref())
    }
}

/// Resource the binding is created for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindResource {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub app_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub route: Option<String>,
}

/// Body of a bind request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindDetails {
    #[serde(default)]
    pub service_id: String,
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub app_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bind_resource: Option<BindResource>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parameters: Option<Parameters>,
}

impl BindDetails {
    /// App the binding is for, from either the legacy field or `bind_resource`.
    #[must_use]
    pub fn app_guid(&self) -> Option<&str> {
        self.app_guid.as_deref().or_else(|| {
            self.bind_resource
                .as_ref()
                .and_then(|resource| resource.app_guid.as_deref())
        })
    }
}

/// Query parameters of an unbind request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbindDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}

/// Query parameters of a deprovision request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprovisionDetails {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
}
