//! Broker routing: dispatches each protocol verb to the owning service.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use broker_core::{
    AsyncCompletion, BindDetails, Binding, BrokerError, Catalog, DeprovisionDetails,
    DeprovisionServiceSpec, LastOperation, OperationToken, ProvisionDetails,
    ProvisionedServiceSpec, ServiceCapability, UnbindDetails, UpdateDetails, UpdateServiceSpec,
};
use tower::Service;
use tracing::debug;

use super::operation::{BrokerRequest, BrokerResponse};
use super::ownership::resolve_owner;
use super::registry::ServiceRegistry;

type BoxedFuture = Pin<Box<dyn Future<Output = Result<BrokerResponse, BrokerError>> + Send>>;

// ---------------------------------------------------------------------------
// BrokerRouter
// ---------------------------------------------------------------------------

/// Single entry point for every protocol verb.
///
/// The router is a pure dispatcher. Its only state is the registry, which is
/// immutable once the router is built, so clones are cheap and concurrent
/// requests need no coordination here. Instance state, and any serialization
/// of concurrent calls against one instance, belongs to the services.
///
/// Resolution rules:
/// - `provision` and `last_operation` resolve by service id (the instance may
///   not exist yet, or may not be claimable until provisioning completes).
/// - `update`, `deprovision`, `bind` and `unbind` resolve by instance ownership.
///
/// Every async result of provision, update and deprovision has its operation
/// marker wrapped in an [`OperationToken`] naming the service, so a later
/// `last_operation` can find its way back.
#[derive(Clone)]
pub struct BrokerRouter {
    registry: Arc<ServiceRegistry>,
}

impl BrokerRouter {
    #[must_use]
    pub fn new(registry: ServiceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    fn service_by_id(&self, service_id: &str) -> Result<&Arc<dyn ServiceCapability>, BrokerError> {
        self.registry
            .get_by_id(service_id)
            .ok_or_else(|| BrokerError::ServiceNotFound {
                service_id: service_id.to_string(),
            })
    }

    /// An instance id has at most one owner. With a single service there is
    /// nobody else to ask.
    async fn ensure_unclaimed_elsewhere(
        &self,
        service_id: &str,
        instance_id: &str,
    ) -> Result<(), BrokerError> {
        if self.registry.len() < 2 {
            return Ok(());
        }
        for other in self.registry.services() {
            if other.id() != service_id && other.has_instance_id(instance_id).await {
                debug!(instance_id, owner = other.id(), "instance id already claimed");
                return Err(BrokerError::conflict(format!(
                    "instance {instance_id} already belongs to service {}",
                    other.id()
                )));
            }
        }
        Ok(())
    }

    /// All registered offerings, in registration order.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        self.registry.catalog()
    }

    /// # Errors
    ///
    /// `ServiceNotFound` if `details.service_id` is not registered, `Conflict`
    /// if another service already owns the instance; otherwise whatever the
    /// service reports.
    pub async fn provision(
        &self,
        instance_id: &str,
        details: ProvisionDetails,
        async_allowed: bool,
    ) -> Result<ProvisionedServiceSpec, BrokerError> {
        let service = self.service_by_id(&details.service_id)?;
        self.ensure_unclaimed_elsewhere(service.id(), instance_id).await?;
        let mut spec = service
            .provision(instance_id, details, async_allowed)
            .await?;
        stamp(&mut spec, service.id())?;
        Ok(spec)
    }

    /// # Errors
    ///
    /// `InstanceNotFound` if no service owns the instance; otherwise whatever
    /// the owner reports.
    pub async fn update(
        &self,
        instance_id: &str,
        details: UpdateDetails,
        async_allowed: bool,
    ) -> Result<UpdateServiceSpec, BrokerError> {
        let service = resolve_owner(&self.registry, instance_id).await?;
        let mut spec = service.update(instance_id, details, async_allowed).await?;
        stamp(&mut spec, service.id())?;
        Ok(spec)
    }

    /// # Errors
    ///
    /// `InstanceNotFound` if no service owns the instance; otherwise whatever
    /// the owner reports.
    pub async fn deprovision(
        &self,
        instance_id: &str,
        details: DeprovisionDetails,
        async_allowed: bool,
    ) -> Result<DeprovisionServiceSpec, BrokerError> {
        let service = resolve_owner(&self.registry, instance_id).await?;
        let mut spec = service
            .deprovision(instance_id, details, async_allowed)
            .await?;
        stamp(&mut spec, service.id())?;
        Ok(spec)
    }

    /// # Errors
    ///
    /// `InstanceNotFound` if no service owns the instance; otherwise whatever
    /// the owner reports.
    pub async fn bind(
        &self,
        instance_id: &str,
        binding_id: &str,
        details: BindDetails,
    ) -> Result<Binding, BrokerError> {
        let service = resolve_owner(&self.registry, instance_id).await?;
        service.bind(instance_id, binding_id, details).await
    }

    /// # Errors
    ///
    /// `InstanceNotFound` if no service owns the instance; otherwise whatever
    /// the owner reports.
    pub async fn unbind(
        &self,
        instance_id: &str,
        binding_id: &str,
        details: UnbindDetails,
    ) -> Result<(), BrokerError> {
        let service = resolve_owner(&self.registry, instance_id).await?;
        service.unbind(instance_id, binding_id, details).await
    }

    /// Polls an async operation.
    ///
    /// `operation` is the token returned by the async response. The service id
    /// it carries selects the service, which receives the remaining operation
    /// data. Without a token the instance owner is asked with no data.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for a malformed token, `ServiceNotFound` if the token names
    /// an unregistered service, `InstanceNotFound` if there is no token and no
    /// owner; otherwise whatever the service reports.
    pub async fn last_operation(
        &self,
        instance_id: &str,
        operation: Option<&str>,
    ) -> Result<LastOperation, BrokerError> {
        let Some(operation) = operation else {
            let service = resolve_owner(&self.registry, instance_id).await?;
            return service.last_operation(instance_id, None).await;
        };

        let token = OperationToken::decode(operation)?;
        let service = self.service_by_id(token.service_id())?;
        debug!(
            instance_id,
            service_id = token.service_id(),
            operation_data = token.operation_data(),
            "polling last operation"
        );
        service
            .last_operation(instance_id, token.operation_data())
            .await
    }

    /// Dispatches a typed request to the matching verb.
    ///
    /// # Errors
    ///
    /// Propagates the error of the dispatched verb unchanged.
    pub async fn dispatch(&self, request: BrokerRequest) -> Result<BrokerResponse, BrokerError> {
        match request {
            BrokerRequest::Catalog => Ok(BrokerResponse::Catalog(self.catalog())),
            BrokerRequest::Provision {
                instance_id,
                details,
                async_allowed,
            } => self
                .provision(&instance_id, details, async_allowed)
                .await
                .map(BrokerResponse::Provisioned),
            BrokerRequest::Update {
                instance_id,
                details,
                async_allowed,
            } => self
                .update(&instance_id, details, async_allowed)
                .await
                .map(BrokerResponse::Updated),
            BrokerRequest::Deprovision {
                instance_id,
                details,
                async_allowed,
            } => self
                .deprovision(&instance_id, details, async_allowed)
                .await
                .map(BrokerResponse::Deprovisioned),
            BrokerRequest::LastOperation {
                instance_id,
                operation,
            } => self
                .last_operation(&instance_id, operation.as_deref())
                .await
                .map(BrokerResponse::LastOperation),
            BrokerRequest::Bind {
                instance_id,
                binding_id,
                details,
            } => self
                .bind(&instance_id, &binding_id, details)
                .await
                .map(BrokerResponse::Bound),
            BrokerRequest::Unbind {
                instance_id,
                binding_id,
                details,
            } => self
                .unbind(&instance_id, &binding_id, details)
                .await
                .map(|()| BrokerResponse::Unbound),
        }
    }
}

/// Wraps the operation marker of an async result in a token naming `service_id`.
/// Synchronous results are left untouched.
fn stamp<C: AsyncCompletion>(completion: &mut C, service_id: &str) -> Result<(), BrokerError> {
    if completion.is_async() {
        let marker = completion.operation().map(str::to_owned);
        let token = OperationToken::new(service_id, marker)?;
        completion.set_operation(Some(token.encode()));
    }
    Ok(())
}

impl Service<BrokerRequest> for BrokerRouter {
    type Response = BrokerResponse;
    type Error = BrokerError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: BrokerRequest) -> Self::Future {
        let router = self.clone();
        Box::pin(async move { router.dispatch(request).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
