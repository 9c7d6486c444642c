//! The broker's parse-side seam: production deployments verify
//! signatures; demo/test callers may opt into unverified parsing (spec
//! §4.5 step 2, §9 open question — production MUST disable this at the
//! boundary, a choice this crate does not enforce itself).

use async_trait::async_trait;
use ssf_tokens::{SingleSecEvent, TokenError};

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn parse_single(&self, raw_set: &str) -> Result<SingleSecEvent, TokenError>;
}

/// Verifies signature, issuer, and audience via an `ssf_tokens::Parser`.
pub struct VerifiedTokenSource {
    parser: ssf_tokens::Parser,
}

impl VerifiedTokenSource {
    pub fn new(parser: ssf_tokens::Parser) -> Self {
        Self { parser }
    }
}

#[async_trait]
impl TokenSource for VerifiedTokenSource {
    async fn parse_single(&self, raw_set: &str) -> Result<SingleSecEvent, TokenError> {
        self.parser.parse_single_verified(raw_set).await
    }
}

/// Decodes claims without verifying the signature. Test/demo only — see
/// the module doc comment.
pub struct UnverifiedTokenSource;

#[async_trait]
impl TokenSource for UnverifiedTokenSource {
    async fn parse_single(&self, raw_set: &str) -> Result<SingleSecEvent, TokenError> {
        let claims_map = ssf_tokens::decode_unverified(raw_set)?;
        let claims_value = serde_json::to_value(claims_map)?;
        let claims: ssf_tokens::SecEventClaims = serde_json::from_value(claims_value)?;
        claims.validate_common()?;
        SingleSecEvent::from_claims(claims)
    }
}
