//! Payload shapes for the event kinds spec §3.2 calls out as the core
//! required for tests. Kinds the spec names but does not detail further
//! (`session-revoked`, `device-compliance-change`, `token-claims-change`,
//! the RISC account/identifier/recovery family) are modeled as
//! [`BarePayload`]: any JSON object, no kind-specific fields required.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;

/// A payload with no kind-specific required fields: the object itself is
/// the entire validation surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BarePayload(pub Value);

impl BarePayload {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.0.is_object() {
            Ok(())
        } else {
            Err(EventError::InvalidPayload {
                event_type: "bare".into(),
                reason: "payload must be a JSON object".into(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialChangePayload {
    pub change_type: String,
}

impl CredentialChangePayload {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.change_type.trim().is_empty() {
            return Err(EventError::InvalidPayload {
                event_type: crate::uris::caep::CREDENTIAL_CHANGE.into(),
                reason: "change_type must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssuranceLevelChangePayload {
    pub current_level: String,
    pub previous_level: String,
    pub change_direction: ChangeDirection,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub initiating_entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason_admin: Option<std::collections::HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason_user: Option<std::collections::HashMap<String, String>>,
}

impl AssuranceLevelChangePayload {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.current_level.trim().is_empty() || self.previous_level.trim().is_empty() {
            return Err(EventError::InvalidPayload {
                event_type: crate::uris::caep::ASSURANCE_LEVEL_CHANGE.into(),
                reason: "current_level and previous_level are required".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationPayload {
    pub state: String,
}

impl VerificationPayload {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.state.trim().is_empty() {
            return Err(EventError::InvalidPayload {
                event_type: crate::uris::ssf::VERIFICATION.into(),
                reason: "state must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamUpdatePayload {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

impl StreamUpdatePayload {
    pub fn validate(&self) -> Result<(), EventError> {
        if self.status.trim().is_empty() {
            return Err(EventError::InvalidPayload {
                event_type: crate::uris::ssf::STREAM_UPDATE.into(),
                reason: "status must not be empty".into(),
            });
        }
        Ok(())
    }
}
