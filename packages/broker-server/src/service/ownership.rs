//! Instance ownership resolution.
//!
//! Instance ids are caller-supplied and not stored by the router, so the owner
//! of an existing instance is found by asking each registered service.

use std::sync::Arc;

use broker_core::{BrokerError, ServiceCapability};
use tracing::debug;

use super::registry::ServiceRegistry;

/// Returns the service that owns `instance_id`.
///
/// Services are asked in registration order and the first to claim the id
/// wins. Services are expected to partition the instance-id space; a second
/// claimant is never consulted. With exactly one registered service the scan
/// is skipped and that service is the owner.
///
/// # Errors
///
/// Returns `BrokerError::InstanceNotFound` if no service claims the id.
pub async fn resolve_owner<'a>(
    registry: &'a ServiceRegistry,
    instance_id: &str,
) -> Result<&'a Arc<dyn ServiceCapability>, BrokerError> {
    if let [only] = registry.services() {
        return Ok(only);
    }

    for service in registry.services() {
        if service.has_instance_id(instance_id).await {
            debug!(instance_id, service_id = service.id(), "resolved instance owner");
            return Ok(service);
        }
    }

    Err(BrokerError::instance_not_found(instance_id))
}
