//! Security Event Token codec (C3): build, sign, parse, and verify
//! JWT-wrapped Security Event Tokens per RFC 8417 / OpenID SSF.

mod builder;
mod claims;
mod error;
mod parser;
mod set;
mod signer;

pub use builder::{SecEventDraft, SetBuilder};
pub use claims::{Audience, SecEventClaims};
pub use error::TokenError;
pub use parser::{decode_unverified, Parser, VerificationPolicy};
pub use set::{MultiSecEvent, SingleSecEvent};
pub use signer::{Signer, SigningKey};
