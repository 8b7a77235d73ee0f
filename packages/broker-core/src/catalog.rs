//! Catalog entities advertised by `GET /v2/catalog`.
//!
//! Offerings and plans are built once when a service is registered and are
//! read-only afterwards. Field names follow the OSB wire format: top-level
//! fields are `snake_case`, metadata blocks are `camelCase`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for [`stable_id`]. Changing it changes every derived id.
const CATALOG_NAMESPACE: Uuid = Uuid::from_u128(0x6f2c_1d7e_58a4_4b0e_9a33_c1f0_2e8d_7b41);

/// Derives a deterministic catalog id from a logical key.
///
/// The platform stores plan and service ids, so the same key must map to the
/// same id across broker restarts. Ids are UUIDv5 values in a fixed namespace.
///
/// # Examples
///
/// ```
/// use broker_core::catalog::stable_id;
///
/// assert_eq!(stable_id("plan-m-v1"), stable_id("plan-m-v1"));
/// assert_ne!(stable_id("plan-m-v1"), stable_id("plan-s-v1"));
/// ```
#[must_use]
pub fn stable_id(key: &str) -> String {
    Uuid::new_v5(&CATALOG_NAMESPACE, key.as_bytes()).to_string()
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// A sized or priced variant of a service offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePlan {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default = "default_free")]
    pub free: bool,
    /// Overrides the offering's `bindable` flag when present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bindable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<PlanMetadata>,
}

fn default_free() -> bool {
    true
}

impl ServicePlan {
    /// Creates a free plan whose id is derived from `key` via [`stable_id`].
    #[must_use]
    pub fn new(key: &str, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: stable_id(key),
            name: name.into(),
            description: description.into(),
            free: true,
            bindable: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_free(mut self, free: bool) -> Self {
        self.free = free;
        self
    }

    #[must_use]
    pub fn with_bindable(mut self, bindable: bool) -> Self {
        self.bindable = Some(bindable);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: PlanMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Display metadata for a plan. Unknown keys are passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetadata {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bullets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub costs: Vec<PlanCost>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One price point of a plan, e.g. `{"amount": {"usd": 9.5}, "unit": "MONTHLY"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCost {
    pub amount: BTreeMap<String, f64>,
    pub unit: String,
}

// ---------------------------------------------------------------------------
// Offerings
// ---------------------------------------------------------------------------

/// Platform permissions a service may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    SyslogDrain,
    RouteForwarding,
    VolumeMount,
}

/// Display metadata for an offering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub provider_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub documentation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub support_url: Option<String>,
}

/// OAuth client the platform creates for a service dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardClient {
    pub id: String,
    pub secret: String,
    pub redirect_uri: String,
}

/// A service advertised in the catalog together with its plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
    pub description: String,
    pub bindable: bool,
    #[serde(default)]
    pub plan_updateable: bool,
    pub plans: Vec<ServicePlan>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub requires: Vec<Requirement>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<ServiceMetadata>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dashboard_client: Option<DashboardClient>,
}

impl ServiceOffering {
    /// Creates a bindable offering with no plans; the id is derived from `key`.
    #[must_use]
    pub fn new(key: &str, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: stable_id(key),
            name: name.into(),
            description: description.into(),
            bindable: true,
            plan_updateable: false,
            plans: Vec::new(),
            tags: Vec::new(),
            requires: Vec::new(),
            metadata: None,
            dashboard_client: None,
        }
    }

    #[must_use]
    pub fn with_plan(mut self, plan: ServicePlan) -> Self {
        self.plans.push(plan);
        self
    }

    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self
    }

    #[must_use]
    pub fn with_requires(mut self, requirement: Requirement) -> Self {
        if !self.requires.contains(&requirement) {
            self.requires.push(requirement);
        }
        self
    }

    #[must_use]
    pub fn with_bindable(mut self, bindable: bool) -> Self {
        self.bindable = bindable;
        self
    }

    #[must_use]
    pub fn with_plan_updateable(mut self, plan_updateable: bool) -> Self {
        self.plan_updateable = plan_updateable;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: ServiceMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_dashboard_client(mut self, client: DashboardClient) -> Self {
        self.dashboard_client = Some(client);
        self
    }

    /// Looks up a plan of this offering by id.
    #[must_use]
    pub fn plan(&self, plan_id: &str) -> Option<&ServicePlan> {
        self.plans.iter().find(|plan| plan.id == plan_id)
    }

    /// Looks up a plan of this offering by name.
    #[must_use]
    pub fn plan_by_name(&self, name: &str) -> Option<&ServicePlan> {
        self.plans.iter().find(|plan| plan.name == name)
    }

    /// Whether instances of `plan` can be bound, honoring the plan override.
    #[must_use]
    pub fn is_plan_bindable(&self, plan: &ServicePlan) -> bool {
        plan.bindable.unwrap_or(self.bindable)
    }
}

/// Body of the catalog response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub services: Vec<ServiceOffering>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_offering() -> ServiceOffering {
        ServiceOffering::new("svc-key", "svc", "a service")
            .with_plan(ServicePlan::new("plan-a", "a", "plan a").with_bindable(false))
            .with_plan(ServicePlan::new("plan-b", "b", "plan b").with_free(false))
            .with_tags(["x", "y", "x"])
    }

    #[test]
    fn stable_id_is_deterministic_uuid() {
        let id = stable_id("my-unique-plan-sized-m-v0.1");
        assert_eq!(id, stable_id("my-unique-plan-sized-m-v0.1"));
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, stable_id("my-unique-plan-sized-s-v0.1"));
    }

    #[test]
    fn plan_override_wins_over_offering_default() {
        let offering = sample_offering();
        let a = offering.plan_by_name("a").unwrap();
        let b = offering.plan_by_name("b").unwrap();
        assert!(!offering.is_plan_bindable(a));
        assert!(offering.is_plan_bindable(b));
    }

    #[test]
    fn tags_are_deduplicated_in_order() {
        assert_eq!(sample_offering().tags, vec!["x", "y"]);
    }

    #[test]
    fn plan_lookup_by_id() {
        let offering = sample_offering();
        assert_eq!(offering.plan(&stable_id("plan-b")).unwrap().name, "b");
        assert!(offering.plan("missing").is_none());
    }

    #[test]
    fn serializes_wire_field_names_and_omits_absent_fields() {
        let offering = sample_offering()
            .with_plan_updateable(true)
            .with_requires(Requirement::SyslogDrain)
            .with_metadata(ServiceMetadata {
                display_name: Some("Svc".to_string()),
                ..ServiceMetadata::default()
            });
        let value = serde_json::to_value(&offering).unwrap();

        assert_eq!(value["plan_updateable"], true);
        assert_eq!(value["requires"], json!(["syslog_drain"]));
        assert_eq!(value["metadata"], json!({"displayName": "Svc"}));
        assert!(value.get("dashboard_client").is_none());
        assert_eq!(value["plans"][0]["bindable"], false);
        assert!(value["plans"][1].get("bindable").is_none());
        assert!(value["plans"][1].get("metadata").is_none());
    }

    #[test]
    fn plan_metadata_passes_unknown_keys_through() {
        let raw = json!({
            "displayName": "Medium",
            "bullets": ["1 cat"],
            "costs": [{"amount": {"usd": 2.5}, "unit": "MONTHLY"}],
            "color": "black"
        });
        let metadata: PlanMetadata = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(metadata.display_name.as_deref(), Some("Medium"));
        assert_eq!(metadata.costs[0].amount["usd"], 2.5);
        assert_eq!(metadata.extra["color"], "black");
        assert_eq!(serde_json::to_value(&metadata).unwrap(), raw);
    }

    #[test]
    fn plan_free_defaults_to_true_when_absent() {
        let plan: ServicePlan =
            serde_json::from_value(json!({"id": "p", "name": "p", "description": "d"})).unwrap();
        assert!(plan.free);
        assert!(plan.bindable.is_none());
    }
}
