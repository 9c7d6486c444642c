//! Hub-receiver loop (spec §4.6 / C6): the hub's sole bus consumer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ssf_broker::InternalMessage;
use ssf_kernel::{Ack, BusMessage, BusMessageHandler, BusSubscriber, ShutdownToken};

use crate::distributor::Distributor;
use crate::error::HubError;

const DEFAULT_MAX_MESSAGES: usize = 100;
const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct HubLoopConfig {
    pub max_messages: usize,
    pub pull_timeout: Duration,
}

impl Default for HubLoopConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            pull_timeout: DEFAULT_PULL_TIMEOUT,
        }
    }
}

/// Owns one bus subscription and repeatedly pulls, decodes, and hands
/// messages to the distributor (spec §4.6 algorithm).
pub struct HubReceiverLoop {
    hub_instance_id: String,
    bus: Arc<dyn BusSubscriber>,
    distributor: Arc<Distributor>,
    shutdown: ShutdownToken,
    config: HubLoopConfig,
    running: Arc<AtomicBool>,
}

impl HubReceiverLoop {
    pub fn new(
        hub_instance_id: impl Into<String>,
        bus: Arc<dyn BusSubscriber>,
        distributor: Arc<Distributor>,
        shutdown: ShutdownToken,
        config: HubLoopConfig,
    ) -> Self {
        Self {
            hub_instance_id: hub_instance_id.into(),
            bus,
            distributor,
            shutdown,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscription_name(&self) -> String {
        format!("ssf-hub-subscription-{}", self.hub_instance_id)
    }

    /// Ensures the subscription exists, then pulls until shutdown is
    /// signalled. Runs until cancelled — callers spawn this as a task.
    pub async fn run(&self) -> Result<(), HubError> {
        self.bus
            .ensure_subscription(ssf_broker::UNIFIED_TOPIC, &self.subscription_name())
            .await?;

        self.running.store(true, Ordering::SeqCst);
        let handler = LoopHandler {
            distributor: Arc::clone(&self.distributor),
        };

        while !self.shutdown.is_cancelled() {
            let pulled = tokio::select! {
                result = self.bus.pull(&self.subscription_name(), self.config.max_messages, self.config.pull_timeout, &handler) => result,
                _ = self.shutdown.cancelled() => break,
            };

            match pulled {
                Ok(_count) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "bus pull failed, backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.shutdown.cancel();
    }
}

struct LoopHandler {
    distributor: Arc<Distributor>,
}

#[async_trait::async_trait]
impl BusMessageHandler for LoopHandler {
    async fn handle(&self, message: BusMessage) -> Ack {
        let decoded: InternalMessage = match serde_json::from_slice(&message.body) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(error = %err, "failed to decode internal message, nacking for redelivery");
                return Ack::Nack;
            }
        };

        match self
            .distributor
            .distribute(decoded.event, decoded.routing.target_receivers)
            .await
        {
            Ok(()) => Ack::Ack,
            Err(err) => {
                tracing::warn!(error = %err, "distributor rejected message hand-off, nacking");
                Ack::Nack
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use ssf_broker::{
        EnvelopeMetadata, EventMetadata, RoutingInfo, SecurityEvent, SubjectView,
        MESSAGE_TYPE_SECURITY_EVENT, SCHEMA_VERSION, SPEC_VERSION,
    };
    use ssf_kernel::{BusPublisher, InMemoryBus, SystemClock, UuidGenerator};
    use ssf_registry::{Receiver, ReceiverRegistry};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_envelope(target_receivers: Vec<String>) -> InternalMessage {
        let now = Utc::now();
        let event = SecurityEvent {
            id: "jti-1".to_string(),
            event_type: "https://schemas.openid.net/secevent/caep/event-type/session-revoked".to_string(),
            source: "https://issuer.example".to_string(),
            spec_version: SPEC_VERSION.to_string(),
            time: now,
            subject: SubjectView {
                format: "email".to_string(),
                identifier: "u@e".to_string(),
                claims: json!({"format": "email", "email": "u@e"}),
            },
            data: json!({}),
            extensions: json!({}),
            metadata: EventMetadata {
                received_at: now,
                processed_at: now,
                transmitter_id: "transmitter-1".to_string(),
                raw_set: "raw".to_string(),
                processing_id: "proc-1".to_string(),
                tags: Default::default(),
            },
        };
        InternalMessage {
            message_id: "msg-1".to_string(),
            message_type: MESSAGE_TYPE_SECURITY_EVENT.to_string(),
            version: SCHEMA_VERSION.to_string(),
            timestamp: now,
            routing: RoutingInfo {
                target_receivers,
                event_type: event.event_type.clone(),
                subject: event.subject.identifier.clone(),
                priority: 0,
                ttl: None,
                tags: Default::default(),
            },
            metadata: EnvelopeMetadata {
                hub_instance_id: "hub-test".to_string(),
                processing_id: "proc-1".to_string(),
                retry_count: 0,
                created_at: now,
                updated_at: now,
            },
            event,
        }
    }

    fn handler(registry: Arc<ReceiverRegistry>) -> LoopHandler {
        LoopHandler {
            distributor: Arc::new(Distributor::new(
                registry,
                Arc::new(UuidGenerator),
                Arc::new(SystemClock),
                ShutdownToken::new(),
                crate::distributor::DistributorConfig::default(),
            )),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_nacked_for_redelivery() {
        let h = handler(Arc::new(ReceiverRegistry::default()));
        let ack = h
            .handle(BusMessage {
                id: "m1".to_string(),
                body: b"not json".to_vec(),
                attributes: Default::default(),
            })
            .await;
        assert_eq!(ack, Ack::Nack);
    }

    #[tokio::test]
    async fn well_formed_envelope_with_no_targets_is_acked() {
        let h = handler(Arc::new(ReceiverRegistry::default()));
        let body = serde_json::to_vec(&sample_envelope(vec![])).unwrap();
        let ack = h
            .handle(BusMessage {
                id: "m1".to_string(),
                body,
                attributes: Default::default(),
            })
            .await;
        assert_eq!(ack, Ack::Ack);
    }

    #[tokio::test]
    async fn loop_pulls_and_hands_off_to_the_distributor_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let registry = Arc::new(ReceiverRegistry::default());
        registry
            .register(
                Receiver::new(
                    "r1",
                    vec!["https://schemas.openid.net/secevent/caep/event-type/session-revoked".to_string()],
                    Some(format!("{}/hook", server.uri())),
                    Utc::now(),
                )
                .unwrap(),
            )
            .unwrap();

        let bus = Arc::new(InMemoryBus::new());
        let shutdown = ShutdownToken::new();
        let distributor = Arc::new(Distributor::new(
            registry.clone(),
            Arc::new(UuidGenerator),
            Arc::new(SystemClock),
            shutdown.clone(),
            crate::distributor::DistributorConfig::default(),
        ));

        let hub_loop = Arc::new(HubReceiverLoop::new(
            "hub-test",
            bus.clone(),
            distributor,
            shutdown.clone(),
            HubLoopConfig {
                max_messages: 10,
                pull_timeout: Duration::from_millis(200),
            },
        ));

        bus.ensure_subscription(ssf_broker::UNIFIED_TOPIC, &hub_loop.subscription_name())
            .await
            .unwrap();
        let body = serde_json::to_vec(&sample_envelope(vec!["r1".to_string()])).unwrap();
        bus.publish(ssf_broker::UNIFIED_TOPIC, body, Default::default())
            .await
            .unwrap();

        let loop_handle = tokio::spawn({
            let hub_loop = hub_loop.clone();
            async move { hub_loop.run().await }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        loop_handle.await.unwrap().unwrap();

        let r1 = registry.get("r1").unwrap();
        assert_eq!(r1.metadata.events_delivered, 1);
    }
}
