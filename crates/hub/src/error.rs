use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("bus error: {0}")]
    Bus(#[from] ssf_kernel::BusError),

    #[error("failed to decode internal message: {0}")]
    MalformedEnvelope(String),
}

/// A delivery-side failure. Counted against the receiver and retried
/// per the receiver's policy (spec §7 "Delivery errors").
#[derive(Debug, Error, Clone)]
pub enum DeliveryError {
    #[error("http request failed: {0}")]
    Request(String),

    #[error("webhook responded with non-2xx status {0}")]
    NonSuccessStatus(u16),

    #[error("authentication method not implemented: {0}")]
    AuthNotImplemented(&'static str),

    #[error("delivery cancelled during backoff")]
    Cancelled,
}
