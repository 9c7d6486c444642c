//! Builder for fresh SETs (spec §4.3 Build).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use ssf_kernel::{Clock, IdGenerator, SystemClock, UuidGenerator};
use ssf_subject::Subject;

use crate::claims::{Audience, SecEventClaims};
use crate::error::TokenError;
use crate::set::{MultiSecEvent, SingleSecEvent};

/// Carries the defaults every fresh token is pre-populated with:
/// a default issuer and an ID generator for `jti`.
pub struct SetBuilder {
    default_issuer: String,
    id_generator: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl SetBuilder {
    pub fn new(default_issuer: impl Into<String>) -> Self {
        Self {
            default_issuer: default_issuer.into(),
            id_generator: Arc::new(UuidGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = generator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Allocates a fresh draft pre-populated with `iat = now()`,
    /// `iss = default_issuer`, `jti = id_generator.next()`.
    pub fn new_sec_event(&self) -> SecEventDraft {
        SecEventDraft {
            claims: SecEventClaims {
                iss: self.default_issuer.clone(),
                jti: self.id_generator.next(),
                iat: self.clock.now().timestamp(),
                aud: None,
                sub_id: Subject::new_opaque("unset").expect("literal is valid"),
                events: HashMap::new(),
                txn: None,
            },
            subject_set: false,
        }
    }
}

/// A SET under construction. Fluent setters mutate in place (spec §4.3).
pub struct SecEventDraft {
    claims: SecEventClaims,
    subject_set: bool,
}

impl SecEventDraft {
    pub fn with_audience(mut self, audience: impl Into<Audience>) -> Self {
        self.claims.aud = Some(audience.into());
        self
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.claims.sub_id = subject;
        self.subject_set = true;
        self
    }

    pub fn with_event(mut self, event_type: impl Into<String>, payload: Value) -> Self {
        self.claims.events.insert(event_type.into(), payload);
        self
    }

    pub fn with_transaction_id(mut self, txn: impl Into<String>) -> Self {
        self.claims.txn = Some(txn.into());
        self
    }

    fn finish(self) -> Result<SecEventClaims, TokenError> {
        if !self.subject_set {
            return Err(TokenError::MissingClaim("sub_id"));
        }
        self.claims.validate_common()?;
        Ok(self.claims)
    }

    /// Finalizes as a single-event token. Fails if `events` does not
    /// contain exactly one entry.
    pub fn build_single(self) -> Result<SingleSecEvent, TokenError> {
        let claims = self.finish()?;
        SingleSecEvent::from_claims(claims)
    }

    /// Finalizes as a multi-event token.
    pub fn build_multi(self) -> Result<MultiSecEvent, TokenError> {
        let claims = self.finish()?;
        Ok(MultiSecEvent::from_claims(claims))
    }
}
