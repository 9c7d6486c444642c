//! Concurrent in-memory receiver registry (spec §4.4).
//!
//! Mirrors the `RwLock<HashMap<..>>` shape `ssf_kernel::InMemoryBus` uses
//! for its topic/subscription tables: readers take a shared lock and
//! clone out what they need, writers take an exclusive lock briefly.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ssf_kernel::{Clock, SystemClock};

use crate::error::RegistryError;
use crate::model::{Receiver, ReceiverStatus};

pub struct ReceiverRegistry {
    receivers: RwLock<HashMap<String, Receiver>>,
    clock: Arc<dyn Clock>,
}

impl Default for ReceiverRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ReceiverRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            receivers: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn register(&self, receiver: Receiver) -> Result<(), RegistryError> {
        receiver.validate()?;
        let mut receivers = self.receivers.write().expect("registry lock not poisoned");
        if receivers.contains_key(&receiver.id) {
            return Err(RegistryError::DuplicateId(receiver.id));
        }
        receivers.insert(receiver.id.clone(), receiver);
        Ok(())
    }

    pub fn update(&self, mut receiver: Receiver) -> Result<(), RegistryError> {
        receiver.validate()?;
        let mut receivers = self.receivers.write().expect("registry lock not poisoned");
        if !receivers.contains_key(&receiver.id) {
            return Err(RegistryError::NotFound(receiver.id));
        }
        receiver.metadata.updated_at = self.clock.now();
        receivers.insert(receiver.id.clone(), receiver);
        Ok(())
    }

    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        let mut receivers = self.receivers.write().expect("registry lock not poisoned");
        receivers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<Receiver> {
        self.receivers
            .read()
            .expect("registry lock not poisoned")
            .get(id)
            .cloned()
    }

    pub fn list(&self) -> Vec<Receiver> {
        self.receivers
            .read()
            .expect("registry lock not poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.receivers.read().expect("registry lock not poisoned").len()
    }

    pub fn count_by_status(&self) -> HashMap<ReceiverStatus, usize> {
        let mut counts = HashMap::new();
        for receiver in self.receivers.read().expect("registry lock not poisoned").values() {
            *counts.entry(receiver.status).or_insert(0) += 1;
        }
        counts
    }

    /// Every active receiver whose `event_types` contains `event_type`
    /// or the wildcard. Per-receiver filter expressions are NOT applied
    /// here (spec §4.4: that stays with the distributor).
    pub fn filter_receivers(&self, event_type: &str) -> Vec<Receiver> {
        self.receivers
            .read()
            .expect("registry lock not poisoned")
            .values()
            .filter(|r| r.status == ReceiverStatus::Active && r.matches_event_type(event_type))
            .cloned()
            .collect()
    }

    fn with_receiver_mut<F>(&self, id: &str, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Receiver, chrono::DateTime<chrono::Utc>),
    {
        let now = self.clock.now();
        let mut receivers = self.receivers.write().expect("registry lock not poisoned");
        let receiver = receivers
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        f(receiver, now);
        Ok(())
    }

    pub fn increment_received(&self, id: &str) -> Result<(), RegistryError> {
        self.with_receiver_mut(id, |r, now| {
            r.metadata.events_received += 1;
            r.metadata.last_event_at = Some(now);
        })
    }

    pub fn increment_delivered(&self, id: &str) -> Result<(), RegistryError> {
        self.with_receiver_mut(id, |r, _| {
            r.metadata.events_delivered += 1;
        })
    }

    pub fn increment_failed(&self, id: &str, error: impl Into<String>) -> Result<(), RegistryError> {
        let error = error.into();
        self.with_receiver_mut(id, |r, _| {
            r.metadata.events_failed += 1;
            r.metadata.last_error = Some(error);
        })
    }
}
