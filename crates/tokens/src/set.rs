//! The two SET shapes (spec §3.3): `SingleSecEvent` hoists the sole
//! entry out of `events` for ergonomic access; `MultiSecEvent` exposes
//! the map directly. Both share the same wire representation — the
//! hoist is a Rust-side convenience, not a different JSON shape.

use serde_json::Value;
use ssf_subject::Subject;

use crate::claims::{Audience, SecEventClaims};
use crate::error::TokenError;

#[derive(Debug, Clone, PartialEq)]
pub struct SingleSecEvent(pub(crate) SecEventClaims);

impl SingleSecEvent {
    /// Wraps already-built claims, enforcing the single-event shape
    /// invariant (spec §4.3: zero or ≥2 entries fails with `ErrShapeMismatch`).
    pub fn from_claims(claims: SecEventClaims) -> Result<Self, TokenError> {
        if claims.events.len() != 1 {
            return Err(TokenError::ShapeMismatch(claims.events.len()));
        }
        Ok(Self(claims))
    }

    pub fn claims(&self) -> &SecEventClaims {
        &self.0
    }

    pub fn issuer(&self) -> &str {
        &self.0.iss
    }

    pub fn jti(&self) -> &str {
        &self.0.jti
    }

    pub fn iat(&self) -> i64 {
        self.0.iat
    }

    pub fn audience(&self) -> Option<&Audience> {
        self.0.aud.as_ref()
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.0.txn.as_deref()
    }

    pub fn subject(&self) -> &Subject {
        &self.0.sub_id
    }

    /// The sole event's type URI.
    pub fn event_type(&self) -> &str {
        self.0
            .events
            .keys()
            .next()
            .expect("from_claims enforces exactly one entry")
    }

    /// The sole event's payload.
    pub fn payload(&self) -> &Value {
        self.0
            .events
            .values()
            .next()
            .expect("from_claims enforces exactly one entry")
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        self.0.validate_common()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiSecEvent(pub(crate) SecEventClaims);

impl MultiSecEvent {
    pub fn from_claims(claims: SecEventClaims) -> Self {
        Self(claims)
    }

    pub fn claims(&self) -> &SecEventClaims {
        &self.0
    }

    pub fn issuer(&self) -> &str {
        &self.0.iss
    }

    pub fn jti(&self) -> &str {
        &self.0.jti
    }

    pub fn subject(&self) -> &Subject {
        &self.0.sub_id
    }

    pub fn events(&self) -> &std::collections::HashMap<String, Value> {
        &self.0.events
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        self.0.validate_common()
    }
}
