//! The `InternalMessage` envelope shared between broker and hub-receiver
//! (spec §3.6 / §8 C8).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::SecurityEvent;

pub const MESSAGE_TYPE_SECURITY_EVENT: &str = "security_event";
pub const SCHEMA_VERSION: &str = "1.0";
pub const UNIFIED_TOPIC: &str = "ssf-hub-events";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingInfo {
    pub target_receivers: Vec<String>,
    pub event_type: String,
    pub subject: String,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeMetadata {
    pub hub_instance_id: String,
    pub processing_id: String,
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InternalMessage {
    pub message_id: String,
    pub message_type: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub event: SecurityEvent,
    pub routing: RoutingInfo,
    pub metadata: EnvelopeMetadata,
}

impl InternalMessage {
    /// Bus message attributes mirroring the key envelope fields, to allow
    /// coarse filtering without parsing the body (spec §6.4).
    pub fn bus_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("message_id".to_string(), self.message_id.clone());
        attrs.insert("message_type".to_string(), self.message_type.clone());
        attrs.insert("version".to_string(), self.version.clone());
        attrs.insert("event_id".to_string(), self.event.id.clone());
        attrs.insert("event_type".to_string(), self.event.event_type.clone());
        attrs.insert("source".to_string(), self.event.source.clone());
        attrs.insert("subject_format".to_string(), self.event.subject.format.clone());
        attrs.insert(
            "transmitter_id".to_string(),
            self.event.metadata.transmitter_id.clone(),
        );
        attrs.insert("processing_id".to_string(), self.metadata.processing_id.clone());
        attrs.insert("hub_instance_id".to_string(), self.metadata.hub_instance_id.clone());
        attrs.insert("priority".to_string(), self.routing.priority.to_string());
        attrs.insert("retry_count".to_string(), self.metadata.retry_count.to_string());
        attrs.insert(
            "target_receivers".to_string(),
            self.routing.target_receivers.join(","),
        );
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventMetadata, SubjectView};
    use serde_json::json;

    fn sample_message() -> InternalMessage {
        let now = Utc::now();
        InternalMessage {
            message_id: "msg-1".to_string(),
            message_type: MESSAGE_TYPE_SECURITY_EVENT.to_string(),
            version: SCHEMA_VERSION.to_string(),
            timestamp: now,
            event: SecurityEvent {
                id: "evt-1".to_string(),
                event_type: "https://schemas.openid.net/secevent/caep/event-type/session-revoked"
                    .to_string(),
                source: "https://issuer.example".to_string(),
                spec_version: "1.0".to_string(),
                time: now,
                subject: SubjectView {
                    format: "email".to_string(),
                    identifier: "u@example.com".to_string(),
                    claims: json!({"format": "email", "email": "u@example.com"}),
                },
                data: json!({"initiating_entity": "policy"}),
                extensions: json!({}),
                metadata: EventMetadata {
                    received_at: now,
                    processed_at: now,
                    transmitter_id: "transmitter-1".to_string(),
                    raw_set: "raw".to_string(),
                    processing_id: "proc-1".to_string(),
                    tags: Default::default(),
                },
            },
            routing: RoutingInfo {
                target_receivers: vec!["r1".to_string(), "r2".to_string()],
                event_type: "https://schemas.openid.net/secevent/caep/event-type/session-revoked"
                    .to_string(),
                subject: "u@example.com".to_string(),
                priority: 1,
                ttl: Some(3600),
                tags: Default::default(),
            },
            metadata: EnvelopeMetadata {
                hub_instance_id: "hub-1".to_string(),
                processing_id: "proc-1".to_string(),
                retry_count: 0,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn internal_message_round_trips_through_json() {
        let original = sample_message();
        let bytes = serde_json::to_vec(&original).unwrap();
        let decoded: InternalMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn bus_attributes_mirror_the_envelope() {
        let message = sample_message();
        let attrs = message.bus_attributes();
        assert_eq!(attrs.get("message_id").unwrap(), "msg-1");
        assert_eq!(attrs.get("event_id").unwrap(), "evt-1");
        assert_eq!(attrs.get("target_receivers").unwrap(), "r1,r2");
        assert_eq!(attrs.get("priority").unwrap(), "1");
    }

    #[test]
    fn ttl_omitted_when_absent_from_json() {
        let mut message = sample_message();
        message.routing.ttl = None;
        let value = serde_json::to_value(&message).unwrap();
        assert!(value["routing"].get("ttl").is_none());
    }
}
