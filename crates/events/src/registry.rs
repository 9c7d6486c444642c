//! The event-kind registry: a process-wide map from event-type URI to a
//! validator for that kind's payload shape.
//!
//! Modeled as an init-time builder that self-registers the known kinds
//! on first access and is otherwise treated as frozen, per the design
//! note in spec §9 ("avoid making it part of the public API" beyond
//! `register`/`parse`/`registered_types`). Duplicate registration is
//! last-write-wins; tests must not depend on registration order.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use serde_json::Value;

use crate::error::EventError;
use crate::kinds::{
    AssuranceLevelChangePayload, BarePayload, CredentialChangePayload, StreamUpdatePayload,
    VerificationPayload,
};
use crate::uris::{caep, risc, ssf};

pub type Validator = Arc<dyn Fn(&Value) -> Result<(), EventError> + Send + Sync>;

fn validator_for<P>(event_type: &'static str) -> Validator
where
    P: serde::de::DeserializeOwned + 'static,
    for<'a> &'a P: ValidatePayload,
{
    Arc::new(move |value: &Value| {
        let payload: P = serde_json::from_value(value.clone()).map_err(|e| EventError::InvalidPayload {
            event_type: event_type.to_string(),
            reason: e.to_string(),
        })?;
        (&payload).validate_payload()
    })
}

/// Narrow trait so `validator_for` can call `.validate()` generically
/// across the differently-shaped payload structs in `kinds`.
pub trait ValidatePayload {
    fn validate_payload(self) -> Result<(), EventError>;
}

impl ValidatePayload for &BarePayload {
    fn validate_payload(self) -> Result<(), EventError> {
        self.validate()
    }
}
impl ValidatePayload for &CredentialChangePayload {
    fn validate_payload(self) -> Result<(), EventError> {
        self.validate()
    }
}
impl ValidatePayload for &AssuranceLevelChangePayload {
    fn validate_payload(self) -> Result<(), EventError> {
        self.validate()
    }
}
impl ValidatePayload for &VerificationPayload {
    fn validate_payload(self) -> Result<(), EventError> {
        self.validate()
    }
}
impl ValidatePayload for &StreamUpdatePayload {
    fn validate_payload(self) -> Result<(), EventError> {
        self.validate()
    }
}

pub struct EventRegistry {
    parsers: RwLock<HashMap<String, Validator>>,
}

impl EventRegistry {
    fn bootstrap() -> Self {
        let registry = Self {
            parsers: RwLock::new(HashMap::new()),
        };
        registry.register(caep::SESSION_REVOKED, validator_for::<BarePayload>(caep::SESSION_REVOKED));
        registry.register(
            caep::CREDENTIAL_CHANGE,
            validator_for::<CredentialChangePayload>(caep::CREDENTIAL_CHANGE),
        );
        registry.register(
            caep::ASSURANCE_LEVEL_CHANGE,
            validator_for::<AssuranceLevelChangePayload>(caep::ASSURANCE_LEVEL_CHANGE),
        );
        registry.register(
            caep::DEVICE_COMPLIANCE_CHANGE,
            validator_for::<BarePayload>(caep::DEVICE_COMPLIANCE_CHANGE),
        );
        registry.register(
            caep::TOKEN_CLAIMS_CHANGE,
            validator_for::<BarePayload>(caep::TOKEN_CLAIMS_CHANGE),
        );
        for uri in [
            risc::ACCOUNT_PURGED,
            risc::ACCOUNT_DISABLED,
            risc::ACCOUNT_ENABLED,
            risc::ACCOUNT_CREDENTIAL_CHANGE_REQUIRED,
            risc::IDENTIFIER_CHANGED,
            risc::IDENTIFIER_RECYCLED,
            risc::CREDENTIAL_COMPROMISE,
            risc::OPT_IN,
            risc::OPT_OUT,
            risc::RECOVERY_ACTIVATED,
            risc::RECOVERY_INFORMATION_CHANGED,
        ] {
            registry.register(uri, validator_for::<BarePayload>(uri));
        }
        registry.register(ssf::VERIFICATION, validator_for::<VerificationPayload>(ssf::VERIFICATION));
        registry.register(ssf::STREAM_UPDATE, validator_for::<StreamUpdatePayload>(ssf::STREAM_UPDATE));
        registry
    }

    /// Registers (or overwrites) the validator for `event_type`.
    pub fn register(&self, event_type: impl Into<String>, validator: Validator) {
        let event_type = event_type.into();
        tracing::info!(event_type = %event_type, "registering event-kind validator");
        self.parsers.write().unwrap().insert(event_type, validator);
    }

    /// Validates `payload` against the registered shape for `event_type`.
    pub fn validate(&self, event_type: &str, payload: &Value) -> Result<(), EventError> {
        tracing::debug!(event_type, "validating event payload");
        let validators = self.parsers.read().unwrap();
        let validator = validators.get(event_type).ok_or_else(|| {
            tracing::warn!(event_type, "unknown event type");
            EventError::UnknownType(event_type.to_string())
        })?;
        validator(payload).inspect_err(|err| {
            tracing::warn!(event_type, %err, "event payload failed validation");
        })
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.parsers.read().unwrap().keys().cloned().collect()
    }
}

static GLOBAL: OnceLock<EventRegistry> = OnceLock::new();

/// The process-wide event registry, self-registering known kinds on
/// first access.
pub fn global_registry() -> &'static EventRegistry {
    GLOBAL.get_or_init(EventRegistry::bootstrap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_are_registered() {
        let registry = global_registry();
        let types = registry.registered_types();
        assert!(types.contains(&caep::SESSION_REVOKED.to_string()));
        assert!(types.contains(&ssf::STREAM_UPDATE.to_string()));
        assert_eq!(types.len(), crate::uris::known_types().len());
    }

    #[test]
    fn validate_rejects_unknown_type() {
        let registry = global_registry();
        let err = registry
            .validate("https://example.com/unknown", &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, EventError::UnknownType(_)));
    }

    #[test]
    fn validate_checks_kind_specific_shape() {
        let registry = global_registry();
        let ok = registry.validate(
            caep::CREDENTIAL_CHANGE,
            &serde_json::json!({"change_type": "password"}),
        );
        assert!(ok.is_ok());

        let bad = registry.validate(caep::CREDENTIAL_CHANGE, &serde_json::json!({}));
        assert!(bad.is_err());
    }
}
