//! Broker core (C5) and message schemas (C8): converts raw SETs into
//! internal `SecurityEvent`s, resolves receivers, and publishes
//! `InternalMessage` envelopes to the unified bus.

mod broker;
mod envelope;
mod error;
mod model;
mod ports;

pub use broker::Broker;
pub use envelope::{
    EnvelopeMetadata, InternalMessage, RoutingInfo, MESSAGE_TYPE_SECURITY_EVENT, SCHEMA_VERSION,
    UNIFIED_TOPIC,
};
pub use error::BrokerError;
pub use model::{EventMetadata, SecurityEvent, SubjectView, SPEC_VERSION};
pub use ports::{TokenSource, UnverifiedTokenSource, VerifiedTokenSource};
