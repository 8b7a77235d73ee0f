//! Typed broker requests and responses flowing through the operation pipeline.

use broker_core::{
    BindDetails, Binding, Catalog, DeprovisionDetails, DeprovisionServiceSpec, LastOperation,
    ProvisionDetails, ProvisionedServiceSpec, UnbindDetails, UpdateDetails, UpdateServiceSpec,
};

/// The seven protocol verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Catalog,
    Provision,
    Update,
    Deprovision,
    LastOperation,
    Bind,
    Unbind,
}

impl Verb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Provision => "provision",
            Self::Update => "update",
            Self::Deprovision => "deprovision",
            Self::LastOperation => "last_operation",
            Self::Bind => "bind",
            Self::Unbind => "unbind",
        }
    }
}

/// A parsed protocol request, ready for dispatch.
#[derive(Debug, Clone)]
pub enum BrokerRequest {
    Catalog,
    Provision {
        instance_id: String,
        details: ProvisionDetails,
        async_allowed: bool,
    },
    Update {
        instance_id: String,
        details: UpdateDetails,
        async_allowed: bool,
    },
    Deprovision {
        instance_id: String,
        details: DeprovisionDetails,
        async_allowed: bool,
    },
    LastOperation {
        instance_id: String,
        /// Encoded operation token, absent if the platform sent none.
        operation: Option<String>,
    },
    Bind {
        instance_id: String,
        binding_id: String,
        details: BindDetails,
    },
    Unbind {
        instance_id: String,
        binding_id: String,
        details: UnbindDetails,
    },
}

impl BrokerRequest {
    #[must_use]
    pub fn verb(&self) -> Verb {
        match self {
            Self::Catalog => Verb::Catalog,
            Self::Provision { .. } => Verb::Provision,
            Self::Update { .. } => Verb::Update,
            Self::Deprovision { .. } => Verb::Deprovision,
            Self::LastOperation { .. } => Verb::LastOperation,
            Self::Bind { .. } => Verb::Bind,
            Self::Unbind { .. } => Verb::Unbind,
        }
    }

    /// Target instance, for every verb except `Catalog`.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        match self {
            Self::Catalog => None,
            Self::Provision { instance_id, .. }
            | Self::Update { instance_id, .. }
            | Self::Deprovision { instance_id, .. }
            | Self::LastOperation { instance_id, .. }
            | Self::Bind { instance_id, .. }
            | Self::Unbind { instance_id, .. } => Some(instance_id),
        }
    }
}

/// Successful result of a dispatched request; one variant per verb.
#[derive(Debug, Clone)]
pub enum BrokerResponse {
    Catalog(Catalog),
    Provisioned(ProvisionedServiceSpec),
    Updated(UpdateServiceSpec),
    Deprovisioned(DeprovisionServiceSpec),
    LastOperation(LastOperation),
    Bound(Binding),
    Unbound,
}
