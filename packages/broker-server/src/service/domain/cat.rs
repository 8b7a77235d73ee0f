//! Example service handing out cats in two sizes.
//!
//! Provisioning, updates and deprovisioning are accepted asynchronously and
//! finish immediately, so the first poll reports `succeeded`. Plan `m` needs a
//! `hello` parameter.

use std::collections::HashMap;

use async_trait::async_trait;
use broker_core::{
    BindDetails, Binding, BrokerError, Credentials, DeprovisionDetails, DeprovisionServiceSpec,
    LastOperation, OperationState, Parameters, PlanMetadata, ProvisionDetails,
    ProvisionedServiceSpec, ServiceCapability, ServiceMetadata, ServiceOffering, ServicePlan,
    UnbindDetails, UpdateDetails, UpdateServiceSpec,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

/// Operation markers returned with async results.
pub mod markers {
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
}

const REQUIRED_PARAMETER: &str = "hello";

struct CatInstance {
    plan_id: String,
    parameters: Parameters,
    /// Binding id -> (app guid, credentials).
    bindings: HashMap<String, (Option<String>, Credentials)>,
}

/// The example cat service.
pub struct CatService {
    offering: ServiceOffering,
    instances: DashMap<String, CatInstance>,
}

impl CatService {
    #[must_use]
    pub fn new() -> Self {
        let medium = ServicePlan::new(
            "my-unique-plan-sized-m-v0.1",
            "m",
            "a medium sized cat, default color: black",
        )
        .with_free(false)
        .with_bindable(true)
        .with_metadata(PlanMetadata {
            display_name: Some("Medium cat".to_string()),
            bullets: vec![format!("requires the `{REQUIRED_PARAMETER}` parameter")],
            ..PlanMetadata::default()
        });
        let small = ServicePlan::new(
            "my-unique-plan-sized-s-v0.1",
            "s",
            "a small sized cat, default color: black",
        )
        .with_free(false)
        .with_bindable(true);

        let offering = ServiceOffering::new(
            "my-very-unique-service",
            "example-service",
            "Example Service does nothing",
        )
        .with_plan(medium)
        .with_plan(small)
        .with_tags(["example", "service"])
        .with_plan_updateable(true)
        .with_metadata(ServiceMetadata {
            display_name: Some("Example Service".to_string()),
            ..ServiceMetadata::default()
        });

        Self {
            offering,
            instances: DashMap::new(),
        }
    }

    /// Checks that `plan_id` belongs to this service and that `parameters`
    /// satisfy it.
    fn validate_plan(&self, plan_id: &str, parameters: &Parameters) -> Result<(), BrokerError> {
        let plan = self
            .offering
            .plan(plan_id)
            .ok_or_else(|| BrokerError::validation(format!("unknown plan {plan_id}")))?;
        if plan.name == "m" && !parameters.contains_key(REQUIRED_PARAMETER) {
            return Err(BrokerError::validation(format!(
                "plan m requires parameter `{REQUIRED_PARAMETER}`"
            )));
        }
        Ok(())
    }

    fn plan_name<'a>(&'a self, plan_id: &'a str) -> &'a str {
        self.offering
            .plan(plan_id)
            .map_or(plan_id, |plan| plan.name.as_str())
    }
}

impl Default for CatService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceCapability for CatService {
    fn offering(&self) -> &ServiceOffering {
        &self.offering
    }

    async fn has_instance_id(&self, instance_id: &str) -> bool {
        self.instances.contains_key(instance_id)
    }

    async fn provision(
        &self,
        instance_id: &str,
        details: ProvisionDetails,
        async_allowed: bool,
    ) -> Result<ProvisionedServiceSpec, BrokerError> {
        if !async_allowed {
            return Err(BrokerError::AsyncRequired);
        }
        let parameters = details.parameters.unwrap_or_default();
        self.validate_plan(&details.plan_id, &parameters)?;

        match self.instances.entry(instance_id.to_string()) {
            Entry::Occupied(existing) => {
                let existing = existing.get();
                if existing.plan_id == details.plan_id && existing.parameters == parameters {
                    Ok(ProvisionedServiceSpec::identical())
                } else {
                    Err(BrokerError::conflict(format!(
                        "instance {instance_id} already exists with different attributes"
                    )))
                }
            }
            Entry::Vacant(slot) => {
                info!(instance_id, plan = self.plan_name(&details.plan_id), "provisioning cat");
                slot.insert(CatInstance {
                    plan_id: details.plan_id,
                    parameters,
                    bindings: HashMap::new(),
                });
                Ok(ProvisionedServiceSpec::accepted(Some(markers::CREATE.to_string())))
            }
        }
    }

    async fn bind(
        &self,
        instance_id: &str,
        binding_id: &str,
        details: BindDetails,
    ) -> Result<Binding, BrokerError> {
        let mut instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| BrokerError::instance_not_found(instance_id))?;

        let bindable = self
            .offering
            .plan(&instance.plan_id)
            .is_some_and(|plan| self.offering.is_plan_bindable(plan));
        if !bindable {
            return Err(BrokerError::validation("plan is not bindable"));
        }

        let app_guid = details.app_guid().map(str::to_owned);
        if let Some((bound_app, credentials)) = instance.bindings.get(binding_id) {
            return if *bound_app == app_guid {
                Ok(Binding::identical(credentials.clone()))
            } else {
                Err(BrokerError::conflict(format!(
                    "binding {binding_id} already exists for another app"
                )))
            };
        }

        let mut credentials = Credentials::new();
        credentials.insert(
            "uri".to_string(),
            json!(format!("cat://{instance_id}/{binding_id}")),
        );
        credentials.insert("username".to_string(), json!(binding_id));
        credentials.insert("password".to_string(), json!(Uuid::new_v4().to_string()));
        credentials.insert("color".to_string(), json!("black"));

        instance
            .bindings
            .insert(binding_id.to_string(), (app_guid, credentials.clone()));
        Ok(Binding::new(credentials))
    }

    async fn update(
        &self,
        instance_id: &str,
        details: UpdateDetails,
        async_allowed: bool,
    ) -> Result<UpdateServiceSpec, BrokerError> {
        if !async_allowed {
            return Err(BrokerError::AsyncRequired);
        }
        let mut instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| BrokerError::instance_not_found(instance_id))?;

        if let Some(previous) = details.previous_plan_id() {
            if previous != instance.plan_id {
                return Err(BrokerError::conflict(format!(
                    "instance {instance_id} is on plan {}, not {}",
                    self.plan_name(&instance.plan_id),
                    self.plan_name(previous)
                )));
            }
        }

        let plan_id = details
            .plan_id
            .unwrap_or_else(|| instance.plan_id.clone());
        let mut parameters = instance.parameters.clone();
        parameters.extend(details.parameters.unwrap_or_default());
        self.validate_plan(&plan_id, &parameters)?;

        info!(instance_id, plan = self.plan_name(&plan_id), "updating cat");
        instance.plan_id = plan_id;
        instance.parameters = parameters;
        Ok(UpdateServiceSpec::accepted(Some(markers::UPDATE.to_string())))
    }

    async fn unbind(
        &self,
        instance_id: &str,
        binding_id: &str,
        _details: UnbindDetails,
    ) -> Result<(), BrokerError> {
        let mut instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| BrokerError::instance_not_found(instance_id))?;
        instance
            .bindings
            .remove(binding_id)
            .map(|_| ())
            .ok_or_else(|| BrokerError::BindingNotFound {
                instance_id: instance_id.to_string(),
                binding_id: binding_id.to_string(),
            })
    }

    async fn deprovision(
        &self,
        instance_id: &str,
        _details: DeprovisionDetails,
        async_allowed: bool,
    ) -> Result<DeprovisionServiceSpec, BrokerError> {
        if !async_allowed {
            return Err(BrokerError::AsyncRequired);
        }
        match self.instances.entry(instance_id.to_string()) {
            Entry::Vacant(_) => Err(BrokerError::instance_not_found(instance_id)),
            Entry::Occupied(entry) if !entry.get().bindings.is_empty() => {
                Err(BrokerError::conflict(format!(
                    "instance {instance_id} still has {} binding(s)",
                    entry.get().bindings.len()
                )))
            }
            Entry::Occupied(entry) => {
                entry.remove();
                info!(instance_id, "released cat");
                Ok(DeprovisionServiceSpec::accepted(Some(markers::DELETE.to_string())))
            }
        }
    }

    async fn last_operation(
        &self,
        instance_id: &str,
        operation_data: Option<&str>,
    ) -> Result<LastOperation, BrokerError> {
        let exists = self.instances.contains_key(instance_id);
        match operation_data {
            None => Ok(LastOperation::succeeded()),
            Some(markers::CREATE | markers::UPDATE) if exists => {
                Ok(LastOperation::new(OperationState::Succeeded, "cat is ready"))
            }
            Some(markers::CREATE | markers::UPDATE) => {
                Err(BrokerError::instance_not_found(instance_id))
            }
            Some(markers::DELETE) if exists => {
                Ok(LastOperation::new(OperationState::InProgress, "releasing cat"))
            }
            Some(markers::DELETE) => {
                Ok(LastOperation::new(OperationState::Succeeded, "cat released"))
            }
            Some(other) => Err(BrokerError::validation(format!("unknown operation {other:?}"))),
        }
    }
}
