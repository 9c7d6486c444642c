//! In-memory bus adapter implementing the unified bus port.
//!
//! Suitable for tests and single-process demos, the same role
//! `InMemoryEventBus` plays for the wider system's domain-event
//! fan-out: each topic fans out to every subscription registered
//! against it, and a subscription that never pulls just accumulates a
//! queue rather than losing messages (unlike a broadcast channel, which
//! drops for lagging subscribers — pull semantics don't allow that).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::application::ports::bus::{
    Ack, BusError, BusMessage, BusMessageHandler, BusPublisher, BusSubscriber,
};
use crate::domain::id::{IdGenerator, UuidGenerator};

struct SubscriptionQueue {
    messages: Mutex<VecDeque<BusMessage>>,
    notify: Notify,
}

impl SubscriptionQueue {
    fn new() -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    fn push(&self, message: BusMessage) {
        self.messages.lock().unwrap().push_back(message);
        self.notify.notify_one();
    }

    fn push_front(&self, message: BusMessage) {
        self.messages.lock().unwrap().push_front(message);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<BusMessage> {
        self.messages.lock().unwrap().pop_front()
    }

    fn is_empty(&self) -> bool {
        self.messages.lock().unwrap().is_empty()
    }
}

/// In-memory implementation of [`Bus`](crate::application::ports::Bus).
pub struct InMemoryBus {
    /// topic -> subscription names fed by that topic
    topics: RwLock<HashMap<String, Vec<String>>>,
    /// subscription name -> its pending queue
    subscriptions: RwLock<HashMap<String, Arc<SubscriptionQueue>>>,
    id_generator: Box<dyn IdGenerator>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            id_generator: Box::new(UuidGenerator),
        }
    }

    fn subscription_queue(&self, name: &str) -> Option<Arc<SubscriptionQueue>> {
        self.subscriptions.read().unwrap().get(name).cloned()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusPublisher for InMemoryBus {
    async fn publish(
        &self,
        topic: &str,
        body: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, BusError> {
        let id = self.id_generator.next();

        let subscriber_names = self
            .topics
            .read()
            .unwrap()
            .get(topic)
            .cloned()
            .unwrap_or_default();

        if subscriber_names.is_empty() {
            debug!(topic, "publish with no subscriptions attached");
        }

        for sub_name in subscriber_names {
            if let Some(queue) = self.subscription_queue(&sub_name) {
                queue.push(BusMessage {
                    id: id.clone(),
                    body: body.clone(),
                    attributes: attributes.clone(),
                });
            }
        }

        Ok(id)
    }
}

#[async_trait]
impl BusSubscriber for InMemoryBus {
    async fn ensure_subscription(&self, topic: &str, subscription_name: &str) -> Result<(), BusError> {
        self.subscriptions
            .write()
            .unwrap()
            .entry(subscription_name.to_string())
            .or_insert_with(|| Arc::new(SubscriptionQueue::new()));

        let mut topics = self.topics.write().unwrap();
        let subs = topics.entry(topic.to_string()).or_default();
        if !subs.iter().any(|s| s == subscription_name) {
            subs.push(subscription_name.to_string());
        }
        Ok(())
    }

    async fn pull(
        &self,
        subscription_name: &str,
        max_messages: usize,
        timeout: Duration,
        handler: &(dyn BusMessageHandler),
    ) -> Result<usize, BusError> {
        let queue = self
            .subscription_queue(subscription_name)
            .ok_or_else(|| BusError::UnknownSubscription(subscription_name.to_string()))?;

        if queue.is_empty() {
            let wait = queue.notify.notified();
            let _ = tokio::time::timeout(timeout, wait).await;
        }

        let mut processed = 0usize;
        while processed < max_messages {
            let Some(message) = queue.pop() else {
                break;
            };
            match handler.handle(message.clone()).await {
                Ack::Ack => {}
                Ack::Nack => {
                    warn!(subscription = subscription_name, message_id = %message.id, "nack, requeueing for redelivery");
                    queue.push_front(message);
                    break;
                }
            }
            processed += 1;
        }

        Ok(processed)
    }
}
