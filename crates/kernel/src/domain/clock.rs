//! A small time seam, the same role `HrnGenerator` plays for identifiers:
//! inject it so tests can fix "now" instead of every component calling
//! `Utc::now()` inline.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
