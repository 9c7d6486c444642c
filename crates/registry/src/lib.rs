//! Concurrent in-memory receiver registry (C4): subscriber descriptors
//! plus operational counters, with event-directed lookup and filtering.

mod error;
mod model;
mod registry;

pub use error::RegistryError;
pub use model::{
    AuthConfig, DeliveryConfig, DeliveryMethod, FilterExpression, FilterOperator, Receiver,
    ReceiverMetadata, ReceiverStatus, RetryConfig, WILDCARD_EVENT_TYPE,
};
pub use registry::ReceiverRegistry;
