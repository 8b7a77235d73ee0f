use async_trait::async_trait;

use crate::catalog::ServiceOffering;
use crate::completion::{
    Binding, DeprovisionServiceSpec, LastOperation, ProvisionedServiceSpec, UpdateServiceSpec,
};
use crate::details::{
    BindDetails, DeprovisionDetails, ProvisionDetails, UnbindDetails, UpdateDetails,
};
use crate::error::BrokerError;

/// Pluggable backend behind one catalog offering.
///
/// Every registered service implements this trait; the router selects an
/// implementation per request and never inspects its concrete type. The
/// protocol verbs default to `BrokerError::Unimplemented`, so a service only
/// overrides what it supports.
///
/// A service that can only finish an operation asynchronously must return
/// `BrokerError::AsyncRequired` when `async_allowed` is false, before doing any
/// work. Services own all instance state and must serialize or reject
/// concurrent lifecycle calls against the same instance id.
#[async_trait]
pub trait ServiceCapability: Send + Sync {
    /// The offering advertised in the catalog. Its `id` is the service id.
    fn offering(&self) -> &ServiceOffering;

    /// Shorthand for `offering().id`.
    fn id(&self) -> &str {
        &self.offering().id
    }

    /// Whether this service currently owns `instance_id`.
    async fn has_instance_id(&self, instance_id: &str) -> bool;

    /// Create an instance.
    async fn provision(
        &self,
        _instance_id: &str,
        _details: ProvisionDetails,
        _async_allowed: bool,
    ) -> Result<ProvisionedServiceSpec, BrokerError> {
        Err(BrokerError::Unimplemented {
            operation: "provision",
        })
    }

    /// Create credentials for an existing instance. Synchronous only.
    async fn bind(
        &self,
        _instance_id: &str,
        _binding_id: &str,
        _details: BindDetails,
    ) -> Result<Binding, BrokerError> {
        Err(BrokerError::Unimplemented { operation: "bind" })
    }

    /// Change the plan or parameters of an instance.
    async fn update(
        &self,
        _instance_id: &str,
        _details: UpdateDetails,
        _async_allowed: bool,
    ) -> Result<UpdateServiceSpec, BrokerError> {
        Err(BrokerError::Unimplemented {
            operation: "update",
        })
    }

    /// Revoke a binding's credentials.
    async fn unbind(
        &self,
        _instance_id: &str,
        _binding_id: &str,
        _details: UnbindDetails,
    ) -> Result<(), BrokerError> {
        Err(BrokerError::Unimplemented {
            operation: "unbind",
        })
    }

    /// Remove an instance.
    async fn deprovision(
        &self,
        _instance_id: &str,
        _details: DeprovisionDetails,
        _async_allowed: bool,
    ) -> Result<DeprovisionServiceSpec, BrokerError> {
        Err(BrokerError::Unimplemented {
            operation: "deprovision",
        })
    }

    /// Report the state of an async operation.
    ///
    /// `operation_data` is the marker this service returned, with the router's
    /// service-id prefix already removed; `None` if the service returned none.
    async fn last_operation(
        &self,
        _instance_id: &str,
        _operation_data: Option<&str>,
    ) -> Result<LastOperation, BrokerError> {
        Err(BrokerError::Unimplemented {
            operation: "last_operation",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ServicePlan;
    use crate::error::ErrorKind;

    struct CatalogOnly {
        offering: ServiceOffering,
    }

    #[async_trait]
    impl ServiceCapability for CatalogOnly {
        fn offering(&self) -> &ServiceOffering {
            &self.offering
        }

        async fn has_instance_id(&self, _instance_id: &str) -> bool {
            false
        }
    }

    fn service() -> CatalogOnly {
        CatalogOnly {
            offering: ServiceOffering::new("catalog-only", "catalog-only", "nothing")
                .with_plan(ServicePlan::new("catalog-only-plan", "only", "only plan")),
        }
    }

    #[test]
    fn id_is_offering_id() {
        let svc = service();
        assert_eq!(svc.id(), svc.offering().id);
    }

    #[tokio::test]
    async fn unsupported_verbs_are_unimplemented() {
        let svc = service();
        let err = svc
            .provision("i", ProvisionDetails::new("s", "p"), true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BrokerError::Unimplemented {
                operation: "provision"
            }
        ));

        let err = svc.last_operation("i", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unimplemented);

        let err = svc
            .unbind("i", "b", UnbindDetails::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unimplemented);
    }
}
