use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("raw_set must not be empty")]
    EmptyRawSet,

    #[error("transmitter_id must not be empty")]
    EmptyTransmitterId,

    #[error("token error: {0}")]
    Token(#[from] ssf_tokens::TokenError),

    #[error("bus error: {0}")]
    Bus(#[from] ssf_kernel::BusError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
