//! Signs SETs into compact JWS (spec §4.3 Sign, §6.1 header requirements).

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::error::TokenError;
use crate::set::{MultiSecEvent, SingleSecEvent};

/// The key material a `Signer` holds. `Rsa`/`Ec` infer `RS256`/`ES256`
/// respectively; the issuer never mixes algorithms within one key.
pub enum SigningKey {
    Rsa { pem: Vec<u8>, kid: String },
    Ec { pem: Vec<u8>, kid: String },
}

impl SigningKey {
    fn algorithm(&self) -> Algorithm {
        match self {
            SigningKey::Rsa { .. } => Algorithm::RS256,
            SigningKey::Ec { .. } => Algorithm::ES256,
        }
    }

    fn kid(&self) -> &str {
        match self {
            SigningKey::Rsa { kid, .. } => kid,
            SigningKey::Ec { kid, .. } => kid,
        }
    }

    fn encoding_key(&self) -> Result<EncodingKey, TokenError> {
        match self {
            SigningKey::Rsa { pem, .. } => {
                EncodingKey::from_rsa_pem(pem).map_err(|e| TokenError::Key(e.to_string()))
            }
            SigningKey::Ec { pem, .. } => {
                EncodingKey::from_ec_pem(pem).map_err(|e| TokenError::Key(e.to_string()))
            }
        }
    }
}

/// Signs `SecEventClaims` into a compact `typ: secevent+jwt` token.
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    fn header(&self) -> Header {
        let mut header = Header::new(self.key.algorithm());
        header.kid = Some(self.key.kid().to_string());
        header.typ = Some("secevent+jwt".to_string());
        header
    }

    fn sign_claims<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let header = self.header();
        let encoding_key = self.key.encoding_key()?;
        encode(&header, claims, &encoding_key).map_err(TokenError::from)
    }

    pub fn sign_single(&self, set: &SingleSecEvent) -> Result<String, TokenError> {
        self.sign_claims(set.claims())
    }

    pub fn sign_multi(&self, set: &MultiSecEvent) -> Result<String, TokenError> {
        self.sign_claims(set.claims())
    }
}
