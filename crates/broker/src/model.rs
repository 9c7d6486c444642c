//! The broker's canonical internal event form (spec §3.4).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssf_subject::Subject;

pub const SPEC_VERSION: &str = "1.0";

/// Flattened view of a Subject: `{format, identifier, claims}` where
/// `identifier` is the variant's primary identifying field and `claims`
/// is the full encoded subject payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectView {
    pub format: String,
    pub identifier: String,
    pub claims: Value,
}

impl SubjectView {
    pub fn from_subject(subject: &Subject) -> Self {
        Self {
            format: subject.format().to_string(),
            identifier: identifier_of(subject),
            claims: subject.encode(),
        }
    }
}

/// The primary identifying value for a subject, used for filter
/// resolution on `subject.identifier` (spec §4.8).
fn identifier_of(subject: &Subject) -> String {
    match subject {
        Subject::Email { email } => email.clone(),
        Subject::Phone { phone } => phone.clone(),
        Subject::IssSub { sub, .. } => sub.clone(),
        Subject::Opaque { id } => id.clone(),
        Subject::Uri { uri } => uri.clone(),
        Subject::Account { uri } => uri.clone(),
        Subject::Did { url } => url.clone(),
        Subject::JwtId { jti, .. } => jti.clone(),
        Subject::SamlAssertionId { assertion_id, .. } => assertion_id.clone(),
        Subject::Complex(_) => subject
            .user()
            .or_else(|| subject.device())
            .or_else(|| subject.session())
            .or_else(|| subject.application())
            .or_else(|| subject.tenant())
            .or_else(|| subject.org_unit())
            .or_else(|| subject.group())
            .map(identifier_of)
            .unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventMetadata {
    pub received_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
    pub transmitter_id: String,
    pub raw_set: String,
    pub processing_id: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// The broker's canonical form of a parsed SET (spec §3.4).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub spec_version: String,
    pub time: DateTime<Utc>,
    pub subject: SubjectView,
    pub data: Value,
    /// Vendor/implementation extensions, resolved by filter expressions
    /// under the `extensions.<k>` path (spec §4.8). Empty unless a
    /// transmitter or downstream enrichment step populates it.
    #[serde(default = "default_extensions")]
    pub extensions: Value,
    pub metadata: EventMetadata,
}

fn default_extensions() -> Value {
    Value::Object(serde_json::Map::new())
}
