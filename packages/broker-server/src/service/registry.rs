use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use broker_core::{Catalog, OperationToken, ServiceCapability, TokenError};
use tracing::info;

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Startup-time registration failures. Never raised while serving requests.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("service id {service_id} is already registered")]
    DuplicateService { service_id: String },
    #[error("plan id {plan_id} of service {service_id} is already registered")]
    DuplicatePlan { service_id: String, plan_id: String },
    #[error("service {service_id} advertises no plans")]
    NoPlans { service_id: String },
    #[error("service id cannot be used in operation tokens: {0}")]
    InvalidServiceId(#[from] TokenError),
}

// ---------------------------------------------------------------------------
// ServiceRegistry
// ---------------------------------------------------------------------------

/// Ordered set of registered services, built once at startup.
///
/// Registration order is significant: the catalog lists offerings in this
/// order and the ownership scan visits services in this order. The registry
/// is handed to the router by value and is immutable from then on.
#[derive(Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<dyn ServiceCapability>>,
    /// Offering id -> index into `services`.
    by_id: HashMap<String, usize>,
    plan_ids: HashSet<String>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the offering id or any plan id is already
    /// registered, if the offering has no plans, or if the offering id could
    /// not be carried in an operation token.
    pub fn register<S>(&mut self, service: S) -> Result<(), RegistryError>
    where
        S: ServiceCapability + 'static,
    {
        self.register_arc(Arc::new(service))
    }

    /// Registers an already shared service.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceRegistry::register`].
    pub fn register_arc(
        &mut self,
        service: Arc<dyn ServiceCapability>,
    ) -> Result<(), RegistryError> {
        let offering = service.offering();
        let service_id = offering.id.clone();

        OperationToken::new(service_id.as_str(), None)?;
        if self.by_id.contains_key(&service_id) {
            return Err(RegistryError::DuplicateService { service_id });
        }
        if offering.plans.is_empty() {
            return Err(RegistryError::NoPlans { service_id });
        }

        let mut seen = HashSet::new();
        for plan in &offering.plans {
            if self.plan_ids.contains(&plan.id) || !seen.insert(plan.id.as_str()) {
                return Err(RegistryError::DuplicatePlan {
                    service_id,
                    plan_id: plan.id.clone(),
                });
            }
        }
        self.plan_ids
            .extend(offering.plans.iter().map(|plan| plan.id.clone()));

        info!(
            service_id = %service_id,
            name = %offering.name,
            plans = offering.plans.len(),
            "registered service"
        );

        self.by_id.insert(service_id, self.services.len());
        self.services.push(service);
        Ok(())
    }

    /// Looks up a service by its offering id.
    #[must_use]
    pub fn get_by_id(&self, service_id: &str) -> Option<&Arc<dyn ServiceCapability>> {
        self.by_id.get(service_id).map(|&idx| &self.services[idx])
    }

    /// Registered services in registration order.
    #[must_use]
    pub fn services(&self) -> &[Arc<dyn ServiceCapability>] {
        &self.services
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Every registered offering, in registration order.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog {
            services: self
                .services
                .iter()
                .map(|service| service.offering().clone())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
