//! The unified bus port (spec §6.3).
//!
//! A minimal publish/subscribe contract the broker and hub-receiver loop
//! are built against. The concrete bus (Pub/Sub, NATS, SQS, ...) is an
//! external collaborator; this crate only ships an in-memory adapter
//! (`infrastructure::InMemoryBus`) for tests and single-process demos.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("topic not found: {0}")]
    UnknownTopic(String),
    #[error("subscription not found: {0}")]
    UnknownSubscription(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("pull failed: {0}")]
    PullFailed(String),
}

/// A single message handed back by a `pull`.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub id: String,
    pub body: Vec<u8>,
    pub attributes: HashMap<String, String>,
}

/// What a handler decides after looking at a [`BusMessage`].
///
/// `Ack` means "the bus need not redeliver this message"; it says
/// nothing about whether downstream delivery ultimately succeeded (see
/// spec §4.6 step 3 — the hub acks once it has accepted responsibility,
/// not once every webhook has fired).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Ack,
    Nack,
}

/// Invoked once per pulled message; returns whether to ack or nack it.
#[async_trait]
pub trait BusMessageHandler: Send + Sync {
    async fn handle(&self, message: BusMessage) -> Ack;
}

#[async_trait]
impl<F> BusMessageHandler for F
where
    F: Fn(BusMessage) -> Ack + Send + Sync,
{
    async fn handle(&self, message: BusMessage) -> Ack {
        (self)(message)
    }
}

/// Publish-side half of the bus contract.
#[async_trait]
pub trait BusPublisher: Send + Sync {
    /// Publishes `body` with `attributes` to `topic`, returning a bus-assigned message id.
    async fn publish(
        &self,
        topic: &str,
        body: Vec<u8>,
        attributes: HashMap<String, String>,
    ) -> Result<String, BusError>;
}

/// Subscribe-side half of the bus contract.
#[async_trait]
pub trait BusSubscriber: Send + Sync {
    /// Idempotently ensures `subscription_name` exists against `topic`.
    async fn ensure_subscription(&self, topic: &str, subscription_name: &str) -> Result<(), BusError>;

    /// Pulls up to `max_messages`, waiting at most `timeout` for the first
    /// message, and invokes `handler` once per pulled message.
    async fn pull(
        &self,
        subscription_name: &str,
        max_messages: usize,
        timeout: Duration,
        handler: &(dyn BusMessageHandler),
    ) -> Result<usize, BusError>;
}

/// The combined contract most callers depend on.
pub trait Bus: BusPublisher + BusSubscriber {}
impl<T: BusPublisher + BusSubscriber> Bus for T {}
