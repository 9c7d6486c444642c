//! The Receiver descriptor and its nested configuration (spec §3.5).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RegistryError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Webhook,
    Pull,
    Push,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryConfig {
    pub method: DeliveryMethod,
    pub batch_size: u32,
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            method: DeliveryMethod::Webhook,
            batch_size: 1,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    None,
    Bearer {
        token: String,
    },
    OAuth2 {
        client_id: String,
        client_secret: String,
        token_url: String,
        scopes: Vec<String>,
    },
    Hmac {
        secret: String,
        algorithm: String,
    },
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig::None
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<(), RegistryError> {
        match self {
            AuthConfig::None => Ok(()),
            AuthConfig::Bearer { token } if token.trim().is_empty() => Err(
                RegistryError::InconsistentAuth("bearer auth requires a non-empty token".into()),
            ),
            AuthConfig::Bearer { .. } => Ok(()),
            AuthConfig::OAuth2 {
                client_id,
                client_secret,
                token_url,
                ..
            } => {
                if client_id.trim().is_empty() || client_secret.trim().is_empty() || token_url.trim().is_empty() {
                    return Err(RegistryError::InconsistentAuth(
                        "oauth2 auth requires client_id, client_secret, and token_url".into(),
                    ));
                }
                url::Url::parse(token_url)
                    .map_err(|e| RegistryError::InconsistentAuth(format!("oauth2 token_url: {e}")))?;
                Ok(())
            }
            AuthConfig::Hmac { secret, .. } if secret.trim().is_empty() => Err(
                RegistryError::InconsistentAuth("hmac auth requires a non-empty secret".into()),
            ),
            AuthConfig::Hmac { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum FilterOperator {
    Equals,
    Contains,
    Matches,
    In,
    Exists,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterExpression {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: Value,
}

/// Exponential backoff parameters (spec §3.5 defaults, §4.7 policy).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    #[serde(with = "humantime_duration")]
    pub initial_interval: Duration,
    #[serde(with = "humantime_duration")]
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Backoff before the attempt numbered `attempt` (0-indexed, i.e.
    /// the wait before the *second* attempt is `backoff_for(0)`).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_interval.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(scaled).min(self.max_interval)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverStatus {
    Active,
    Inactive,
    Error,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiverMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub events_received: u64,
    pub events_delivered: u64,
    pub events_failed: u64,
    pub last_error: Option<String>,
    pub tags: HashMap<String, String>,
}

impl ReceiverMetadata {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            last_event_at: None,
            events_received: 0,
            events_delivered: 0,
            events_failed: 0,
            last_error: None,
            tags: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Receiver {
    pub id: String,
    pub name: String,
    pub description: String,
    pub webhook_url: Option<String>,
    pub event_types: Vec<String>,
    pub delivery: DeliveryConfig,
    pub auth: AuthConfig,
    pub filters: Vec<FilterExpression>,
    pub retry: RetryConfig,
    pub status: ReceiverStatus,
    pub metadata: ReceiverMetadata,
}

pub const WILDCARD_EVENT_TYPE: &str = "*";

impl Receiver {
    /// Builds a receiver with spec-mandated defaults, at the `now` the
    /// caller supplies (registries are the only place a clock is needed).
    pub fn new(
        id: impl Into<String>,
        event_types: Vec<String>,
        webhook_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, RegistryError> {
        let receiver = Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            webhook_url,
            event_types,
            delivery: DeliveryConfig::default(),
            auth: AuthConfig::default(),
            filters: Vec::new(),
            retry: RetryConfig::default(),
            status: ReceiverStatus::Active,
            metadata: ReceiverMetadata::new(now),
        };
        receiver.validate()?;
        Ok(receiver)
    }

    pub fn matches_event_type(&self, event_type: &str) -> bool {
        self.event_types
            .iter()
            .any(|t| t == event_type || t == WILDCARD_EVENT_TYPE)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.id.trim().is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if self.event_types.is_empty() {
            return Err(RegistryError::EmptyEventTypes);
        }
        if self.delivery.method == DeliveryMethod::Webhook {
            match &self.webhook_url {
                None => return Err(RegistryError::MissingWebhookUrl),
                Some(raw) => {
                    url::Url::parse(raw).map_err(|e| RegistryError::InvalidWebhookUrl(e.to_string()))?;
                }
            }
        }
        self.auth.validate()?;
        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
