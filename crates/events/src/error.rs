use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown event type `{0}`")]
    UnknownType(String),

    #[error("malformed payload JSON: {0}")]
    MalformedJson(String),

    #[error("payload does not match shape for `{event_type}`: {reason}")]
    InvalidPayload { event_type: String, reason: String },

    #[error("decoded event type `{decoded}` does not match requested type `{requested}`")]
    TypeMismatch { requested: String, decoded: String },
}
