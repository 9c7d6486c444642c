use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("receiver `{0}` already registered")]
    DuplicateId(String),

    #[error("receiver `{0}` not found")]
    NotFound(String),

    #[error("receiver id must not be empty")]
    EmptyId,

    #[error("event_types must not be empty")]
    EmptyEventTypes,

    #[error("webhook delivery requires a webhook_url")]
    MissingWebhookUrl,

    #[error("invalid webhook url: {0}")]
    InvalidWebhookUrl(String),

    #[error("auth config is inconsistent: {0}")]
    InconsistentAuth(String),
}
