//! Distributor (spec §4.7 / C7): applies per-receiver filters and
//! delivers to webhooks with authenticated requests and exponential
//! backoff retries.
//!
//! One task per `(receiver, event)` pair, bounded by a semaphore — an
//! unbounded `tokio::spawn` per pair is acceptable at small scale but
//! the spec flags it (§9) as something that needs a cap under load.

use std::sync::Arc;
use std::time::Instant;

use ssf_broker::SecurityEvent;
use ssf_kernel::{Clock, IdGenerator, ShutdownToken};
use ssf_registry::{AuthConfig, DeliveryMethod, Receiver, ReceiverRegistry};
use tokio::sync::Semaphore;

use crate::delivery::{DeliveryStatus, EventDelivery};
use crate::error::{DeliveryError, HubError};
use crate::filter;

#[derive(Debug, Clone, Copy)]
pub struct DistributorConfig {
    pub max_concurrent_deliveries: usize,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_deliveries: 64,
        }
    }
}

pub struct Distributor {
    registry: Arc<ReceiverRegistry>,
    http: reqwest::Client,
    id_generator: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownToken,
    semaphore: Arc<Semaphore>,
}

impl Distributor {
    pub fn new(
        registry: Arc<ReceiverRegistry>,
        id_generator: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        shutdown: ShutdownToken,
        config: DistributorConfig,
    ) -> Self {
        Self {
            registry,
            http: reqwest::Client::new(),
            id_generator,
            clock,
            shutdown,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_deliveries)),
        }
    }

    /// Fans out `event` to every receiver in `target_receivers`. Returns
    /// once delivery has been handed off (spawned), not once every
    /// webhook has fired — the caller's bus ack should follow this
    /// return, not the eventual delivery outcome.
    pub async fn distribute(self: &Arc<Self>, event: SecurityEvent, target_receivers: Vec<String>) -> Result<(), HubError> {
        for receiver_id in target_receivers {
            let this = Arc::clone(self);
            let event = event.clone();
            tokio::spawn(async move {
                this.deliver_to_receiver(receiver_id, event).await;
            });
        }
        Ok(())
    }

    async fn deliver_to_receiver(&self, receiver_id: String, event: SecurityEvent) {
        let Some(receiver) = self.registry.get(&receiver_id) else {
            tracing::warn!(receiver_id = %receiver_id, "receiver missing from registry, skipping delivery");
            return;
        };

        if !receiver.matches_event_type(&event.event_type) {
            return;
        }
        if !filter::receiver_matches(&event, &receiver.filters) {
            return;
        }

        match receiver.delivery.method {
            DeliveryMethod::Webhook => self.deliver_webhook(&receiver, &event).await,
            other => {
                tracing::info!(receiver_id = %receiver.id, method = ?other, "unsupported delivery method, skipping");
            }
        }
    }

    async fn deliver_webhook(&self, receiver: &Receiver, event: &SecurityEvent) {
        let delivery_id = self.id_generator.next();
        let mut attempt: u32 = 0;

        loop {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let start = Instant::now();
            let outcome = self.attempt_webhook(receiver, event).await;
            drop(permit);
            attempt += 1;

            match outcome {
                Ok((status_code, response_body)) => {
                    let record = EventDelivery {
                        status: DeliveryStatus::Delivered,
                        delivered_at: Some(self.clock.now()),
                        response_code: Some(status_code),
                        response_body: Some(response_body),
                        error_message: None,
                        duration_ms: start.elapsed().as_millis() as u64,
                        next_retry_at: None,
                        attempt,
                        ..EventDelivery::pending(delivery_id, receiver.id.clone(), event.id.clone())
                    };
                    tracing::info!(delivery = ?record, attempt, "webhook delivered");
                    if let Err(err) = self.registry.increment_delivered(&receiver.id) {
                        tracing::warn!(receiver_id = %receiver.id, error = %err, "failed to bump delivered counter");
                    }
                    return;
                }
                Err(err) => {
                    if attempt > receiver.retry.max_retries {
                        let record = EventDelivery {
                            status: DeliveryStatus::Abandoned,
                            error_message: Some(err.to_string()),
                            duration_ms: start.elapsed().as_millis() as u64,
                            attempt,
                            ..EventDelivery::pending(delivery_id, receiver.id.clone(), event.id.clone())
                        };
                        tracing::warn!(delivery = ?record, "webhook delivery abandoned after exhausting retries");
                        if let Err(reg_err) = self.registry.increment_failed(&receiver.id, err.to_string()) {
                            tracing::warn!(receiver_id = %receiver.id, error = %reg_err, "failed to bump failed counter");
                        }
                        return;
                    }

                    let backoff = receiver.retry.backoff_for(attempt - 1);
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = self.shutdown.cancelled() => {
                            let record = EventDelivery {
                                status: DeliveryStatus::Abandoned,
                                error_message: Some(DeliveryError::Cancelled.to_string()),
                                attempt,
                                ..EventDelivery::pending(delivery_id, receiver.id.clone(), event.id.clone())
                            };
                            tracing::warn!(delivery = ?record, "webhook delivery abandoned: cancelled during backoff");
                            if let Err(reg_err) = self.registry.increment_failed(&receiver.id, "delivery cancelled during backoff") {
                                tracing::warn!(receiver_id = %receiver.id, error = %reg_err, "failed to bump failed counter");
                            }
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn attempt_webhook(&self, receiver: &Receiver, event: &SecurityEvent) -> Result<(u16, String), DeliveryError> {
        let webhook_url = receiver
            .webhook_url
            .as_deref()
            .ok_or_else(|| DeliveryError::Request("receiver has no webhook_url".to_string()))?;

        let mut request = self
            .http
            .post(webhook_url)
            .timeout(receiver.delivery.timeout)
            .header("Content-Type", "application/json")
            .header("User-Agent", "SSF-Hub/1.0")
            .header("X-SSF-Event-ID", event.id.as_str())
            .header("X-SSF-Event-Type", event.event_type.as_str());

        request = match &receiver.auth {
            AuthConfig::None => request,
            AuthConfig::Bearer { token } => request.header("Authorization", format!("Bearer {token}")),
            AuthConfig::Hmac { .. } => return Err(DeliveryError::AuthNotImplemented("hmac")),
            AuthConfig::OAuth2 { .. } => return Err(DeliveryError::AuthNotImplemented("oauth2")),
        };

        let body = serde_json::to_vec(event).map_err(|e| DeliveryError::Request(e.to_string()))?;
        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        let status = response.status();
        let body_bytes = response.bytes().await.unwrap_or_default();
        let truncated = EventDelivery::truncate_response_body(&body_bytes);

        if status.is_success() {
            Ok((status.as_u16(), truncated))
        } else {
            Err(DeliveryError::NonSuccessStatus(status.as_u16()))
        }
    }
}
