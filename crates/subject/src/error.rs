use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubjectError {
    #[error("missing required field `format`")]
    MissingFormat,

    #[error("unrecognized subject format `{0}`")]
    InvalidFormat(String),

    #[error("field `{field}` is required for format `{format}`")]
    MissingField { format: &'static str, field: &'static str },

    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("complex subject must have at least one populated component")]
    EmptyComplexSubject,

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}
