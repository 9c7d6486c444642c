//! Per-attempt delivery bookkeeping (spec §3.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Failed,
    Retrying,
    Abandoned,
}

/// Response body capture is bounded to this many bytes (spec §4.7/§9).
pub const RESPONSE_BODY_CAP: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDelivery {
    pub delivery_id: String,
    pub receiver_id: String,
    pub event_id: String,
    pub attempt: u32,
    pub status: DeliveryStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub response_code: Option<u16>,
    pub response_body: Option<String>,
    pub duration_ms: u64,
    pub next_retry_at: Option<DateTime<Utc>>,
}

impl EventDelivery {
    pub fn pending(delivery_id: impl Into<String>, receiver_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            delivery_id: delivery_id.into(),
            receiver_id: receiver_id.into(),
            event_id: event_id.into(),
            attempt: 0,
            status: DeliveryStatus::Pending,
            delivered_at: None,
            error_message: None,
            response_code: None,
            response_body: None,
            duration_ms: 0,
            next_retry_at: None,
        }
    }

    pub fn truncate_response_body(body: &[u8]) -> String {
        let cut = body.len().min(RESPONSE_BODY_CAP);
        String::from_utf8_lossy(&body[..cut]).into_owned()
    }
}
