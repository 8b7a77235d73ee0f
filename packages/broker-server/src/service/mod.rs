//! Request routing for the broker.
//!
//! 1. **Registry** (`registry`): ordered set of services, built at startup
//! 2. **Ownership** (`ownership`): finds the service that owns an instance id
//! 3. **Routing** (`router`): dispatches each verb to the right service
//! 4. **Middleware** (`middleware`): tower layers wrapped around the router
//! 5. **Domain services** (`domain`): the services this binary ships with

pub mod domain;
pub mod middleware;
pub mod operation;
pub mod ownership;
pub mod registry;
pub mod router;

pub use operation::{BrokerRequest, BrokerResponse, Verb};
pub use ownership::resolve_owner;
pub use registry::{RegistryError, ServiceRegistry};
pub use router::BrokerRouter;
