//! Broker core (spec §4.5 / C5): ingest a raw SET, resolve receivers,
//! publish an `InternalMessage` to the unified bus.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ssf_kernel::{BusPublisher, Clock, IdGenerator};
use ssf_registry::ReceiverRegistry;

use crate::envelope::{EnvelopeMetadata, InternalMessage, RoutingInfo, MESSAGE_TYPE_SECURITY_EVENT, SCHEMA_VERSION, UNIFIED_TOPIC};
use crate::error::BrokerError;
use crate::model::{EventMetadata, SecurityEvent, SubjectView, SPEC_VERSION};
use crate::ports::TokenSource;

pub struct Broker {
    hub_instance_id: String,
    token_source: Arc<dyn TokenSource>,
    registry: Arc<ReceiverRegistry>,
    bus: Arc<dyn BusPublisher>,
    id_generator: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Broker {
    pub fn new(
        hub_instance_id: impl Into<String>,
        token_source: Arc<dyn TokenSource>,
        registry: Arc<ReceiverRegistry>,
        bus: Arc<dyn BusPublisher>,
        id_generator: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            hub_instance_id: hub_instance_id.into(),
            token_source,
            registry,
            bus,
            id_generator,
            clock,
        }
    }

    /// Ingests one raw SET from `transmitter_id` (spec §4.5 algorithm).
    pub async fn process(&self, raw_set: &str, transmitter_id: &str) -> Result<(), BrokerError> {
        if raw_set.trim().is_empty() {
            return Err(BrokerError::EmptyRawSet);
        }
        if transmitter_id.trim().is_empty() {
            return Err(BrokerError::EmptyTransmitterId);
        }

        let set = self.token_source.parse_single(raw_set).await?;
        let now = self.clock.now();
        let event = self.build_security_event(&set, raw_set, transmitter_id, now);

        let targets = self.registry.filter_receivers(&event.event_type);
        if targets.is_empty() {
            tracing::info!(event_id = %event.id, event_type = %event.event_type, "no receivers matched, skipping publish");
            return Ok(());
        }

        let mut target_ids = Vec::with_capacity(targets.len());
        for receiver in &targets {
            if let Err(err) = self.registry.increment_received(&receiver.id) {
                tracing::warn!(receiver_id = %receiver.id, error = %err, "failed to bump received counter");
            }
            target_ids.push(receiver.id.clone());
        }

        let message = self.build_envelope(event, target_ids, now);
        let body = serde_json::to_vec(&message)?;
        let attributes = message.bus_attributes();

        self.bus.publish(UNIFIED_TOPIC, body, attributes).await?;
        Ok(())
    }

    fn build_security_event(
        &self,
        set: &ssf_tokens::SingleSecEvent,
        raw_set: &str,
        transmitter_id: &str,
        now: DateTime<Utc>,
    ) -> SecurityEvent {
        let time = DateTime::from_timestamp(set.iat(), 0).unwrap_or(now);
        SecurityEvent {
            id: set.jti().to_string(),
            event_type: set.event_type().to_string(),
            source: set.issuer().to_string(),
            spec_version: SPEC_VERSION.to_string(),
            time,
            subject: SubjectView::from_subject(set.subject()),
            data: set.payload().clone(),
            extensions: serde_json::Value::Object(serde_json::Map::new()),
            metadata: EventMetadata {
                received_at: now,
                processed_at: now,
                transmitter_id: transmitter_id.to_string(),
                raw_set: raw_set.to_string(),
                processing_id: self.id_generator.next(),
                tags: HashMap::new(),
            },
        }
    }

    fn build_envelope(&self, event: SecurityEvent, target_receivers: Vec<String>, now: DateTime<Utc>) -> InternalMessage {
        let processing_id = event.metadata.processing_id.clone();
        InternalMessage {
            message_id: self.id_generator.next(),
            message_type: MESSAGE_TYPE_SECURITY_EVENT.to_string(),
            version: SCHEMA_VERSION.to_string(),
            timestamp: now,
            routing: RoutingInfo {
                target_receivers,
                event_type: event.event_type.clone(),
                subject: event.subject.identifier.clone(),
                priority: 0,
                ttl: None,
                tags: HashMap::new(),
            },
            metadata: EnvelopeMetadata {
                hub_instance_id: self.hub_instance_id.clone(),
                processing_id,
                retry_count: 0,
                created_at: now,
                updated_at: now,
            },
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::UnverifiedTokenSource;
    use ssf_kernel::{BusSubscriber, InMemoryBus, SystemClock, UuidGenerator};
    use ssf_registry::Receiver;
    use ssf_subject::Subject;
    use ssf_tokens::SetBuilder;

    fn broker(bus: Arc<InMemoryBus>, registry: Arc<ReceiverRegistry>) -> Broker {
        Broker::new(
            "hub-test-instance",
            Arc::new(UnverifiedTokenSource),
            registry,
            bus,
            Arc::new(UuidGenerator),
            Arc::new(SystemClock),
        )
    }

    fn sample_raw_set() -> String {
        let set = SetBuilder::new("https://issuer.example")
            .new_sec_event()
            .with_subject(Subject::new_email("u@example.com").unwrap())
            .with_event(
                "https://schemas.openid.net/secevent/caep/event-type/session-revoked",
                serde_json::json!({"initiating_entity": "policy"}),
            )
            .build_single()
            .unwrap();
        // Unverified demo path doesn't need a real signature; encode the
        // claims as the payload segment of a compact-looking token.
        let claims_json = serde_json::to_vec(set.claims()).unwrap();
        use base64::Engine;
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(claims_json);
        format!("header.{payload}.signature")
    }

    #[tokio::test]
    async fn rejects_empty_raw_set() {
        let registry = Arc::new(ReceiverRegistry::default());
        let bus = Arc::new(InMemoryBus::new());
        let err = broker(bus, registry).process("", "transmitter-1").await.unwrap_err();
        assert!(matches!(err, BrokerError::EmptyRawSet));
    }

    #[tokio::test]
    async fn rejects_empty_transmitter_id() {
        let registry = Arc::new(ReceiverRegistry::default());
        let bus = Arc::new(InMemoryBus::new());
        let err = broker(bus, registry)
            .process(&sample_raw_set(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::EmptyTransmitterId));
    }

    #[tokio::test]
    async fn publishes_and_bumps_received_counter_when_a_receiver_matches() {
        let registry = Arc::new(ReceiverRegistry::default());
        registry
            .register(
                Receiver::new(
                    "r1",
                    vec!["https://schemas.openid.net/secevent/caep/event-type/session-revoked".to_string()],
                    Some("https://receiver.example/hook".to_string()),
                    Utc::now(),
                )
                .unwrap(),
            )
            .unwrap();

        let bus = Arc::new(InMemoryBus::new());
        bus.ensure_subscription("ssf-hub-events", "ssf-hub-subscription-hub-test-instance")
            .await
            .unwrap();

        broker(bus.clone(), registry.clone())
            .process(&sample_raw_set(), "transmitter-1")
            .await
            .unwrap();

        assert_eq!(registry.get("r1").unwrap().metadata.events_received, 1);
    }

    #[tokio::test]
    async fn skips_publish_without_matching_receivers() {
        let registry = Arc::new(ReceiverRegistry::default());
        let bus = Arc::new(InMemoryBus::new());
        broker(bus, registry)
            .process(&sample_raw_set(), "transmitter-1")
            .await
            .unwrap();
    }
}
