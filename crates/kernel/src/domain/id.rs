//! ID generators shared by every bounded context that needs to mint an
//! identifier: event IDs, processing IDs, delivery IDs, hub instance IDs.
//!
//! Mirrors the role `HrnGenerator` plays in the wider system: a small
//! trait object handed to use cases so identifier strategy is a
//! construction-time choice, not a scattered `Uuid::new_v4()` call.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as BASE64_STANDARD, URL_SAFE_NO_PAD};

/// Common contract for every ID generator kind.
///
/// Implementations must never panic; on entropy-source failure the
/// `Random` generator falls back to a UUID rather than aborting a
/// caller that may be mid-ingestion.
pub trait IdGenerator: Send + Sync {
    fn next(&self) -> String;
}

/// Standard random (v4) UUID generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Monotonically increasing counter with a fixed prefix and zero-padded width.
///
/// `SequentialGenerator::new("evt-", 6)` produces `evt-000001`, `evt-000002`, ...
pub struct SequentialGenerator {
    prefix: String,
    width: usize,
    counter: AtomicU64,
}

impl SequentialGenerator {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialGenerator {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{:0width$}", self.prefix, n, width = self.width)
    }
}

/// Nanosecond-timestamp generator with an optional suffix generator to
/// disambiguate IDs minted within the same tick.
pub struct TimestampGenerator {
    suffix: Option<Box<dyn IdGenerator>>,
}

impl TimestampGenerator {
    pub fn new() -> Self {
        Self { suffix: None }
    }

    pub fn with_suffix(suffix: Box<dyn IdGenerator>) -> Self {
        Self {
            suffix: Some(suffix),
        }
    }
}

impl Default for TimestampGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for TimestampGenerator {
    fn next(&self) -> String {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| chrono::Utc::now().timestamp() * 1_000_000_000);
        match &self.suffix {
            Some(gen) => format!("{nanos}-{}", gen.next()),
            None => nanos.to_string(),
        }
    }
}

/// Encoding used by [`RandomGenerator`] for the bytes it draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomEncoding {
    Hex,
    Base64,
    Base64Url,
}

impl fmt::Display for RandomEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RandomEncoding::Hex => "hex",
            RandomEncoding::Base64 => "base64",
            RandomEncoding::Base64Url => "base64url",
        };
        f.write_str(s)
    }
}

/// Cryptographically-random ID generator.
///
/// Draws `byte_len` bytes from the system RNG and encodes them per
/// `encoding`, with an optional prefix. On entropy-source failure this
/// never panics: it logs and falls back to a fresh UUID so a caller
/// minting a delivery ID never blows up ingestion over RNG flakiness.
pub struct RandomGenerator {
    byte_len: usize,
    encoding: RandomEncoding,
    prefix: Option<String>,
}

impl RandomGenerator {
    pub fn new(byte_len: usize, encoding: RandomEncoding) -> Self {
        Self {
            byte_len,
            encoding,
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn draw(&self) -> Option<Vec<u8>> {
        use ring::rand::{SecureRandom, SystemRandom};
        let rng = SystemRandom::new();
        let mut buf = vec![0u8; self.byte_len];
        rng.fill(&mut buf).ok()?;
        Some(buf)
    }

    fn encode(&self, bytes: &[u8]) -> String {
        match self.encoding {
            RandomEncoding::Hex => hex::encode(bytes),
            RandomEncoding::Base64 => BASE64_STANDARD.encode(bytes),
            RandomEncoding::Base64Url => URL_SAFE_NO_PAD.encode(bytes),
        }
    }
}

impl IdGenerator for RandomGenerator {
    fn next(&self) -> String {
        let body = match self.draw() {
            Some(bytes) => self.encode(&bytes),
            None => {
                tracing::warn!(
                    encoding = %self.encoding,
                    "entropy source failed, falling back to UUID"
                );
                uuid::Uuid::new_v4().to_string()
            }
        };
        match &self.prefix {
            Some(p) => format!("{p}{body}"),
            None => body,
        }
    }
}
