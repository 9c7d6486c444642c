//! The shared claim set both SET shapes carry (spec §3.3, §6.1).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssf_subject::Subject;

use crate::error::TokenError;

/// `aud` may be a single string or an array of strings (spec §6.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::Single(s) => s == value,
            Audience::Multiple(v) => v.iter().any(|a| a == value),
        }
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Audience::Single(value.to_string())
    }
}

impl From<Vec<String>> for Audience {
    fn from(value: Vec<String>) -> Self {
        Audience::Multiple(value)
    }
}

/// The registered + SSF-specific claims shared by single- and
/// multi-event SETs (spec §3.3 / §6.1). `exp`/`nbf` are deliberately
/// absent from this type: the spec requires they never be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecEventClaims {
    pub iss: String,
    pub jti: String,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub aud: Option<Audience>,
    pub sub_id: Subject,
    pub events: HashMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub txn: Option<String>,
}

impl SecEventClaims {
    /// Structural + semantic validation shared by both shapes (spec §4.3 Validate).
    pub fn validate_common(&self) -> Result<(), TokenError> {
        if self.iss.trim().is_empty() {
            return Err(TokenError::MissingClaim("iss"));
        }
        if self.jti.trim().is_empty() {
            return Err(TokenError::MissingClaim("jti"));
        }
        if self.events.is_empty() {
            return Err(TokenError::MissingClaim("events"));
        }
        self.sub_id.validate()?;
        for (event_type, payload) in &self.events {
            ssf_events::Event::new(event_type.clone(), payload.clone())?;
        }
        Ok(())
    }
}
