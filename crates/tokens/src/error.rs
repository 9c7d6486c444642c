use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing required claim `{0}`")]
    MissingClaim(&'static str),

    #[error("single-event token must carry exactly one entry in `events`, found {0}")]
    ShapeMismatch(usize),

    #[error("unsupported signing/verification algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("token header is missing `kid`")]
    MissingKid,

    #[error("no key found for kid `{0}`")]
    UnknownKid(String),

    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    #[error("issuer mismatch: expected `{expected}`, got `{actual}`")]
    IssuerMismatch { expected: String, actual: String },

    #[error("audience mismatch: expected `{expected}` to be present in token audience")]
    AudienceMismatch { expected: String },

    #[error("invalid subject: {0}")]
    Subject(#[from] ssf_subject::SubjectError),

    #[error("invalid event payload: {0}")]
    Event(#[from] ssf_events::EventError),

    #[error("key error: {0}")]
    Key(String),

    #[error("malformed token JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
