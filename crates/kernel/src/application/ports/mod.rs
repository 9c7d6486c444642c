//! Application ports for the shared kernel.

pub mod bus;

pub use bus::{Ack, Bus, BusError, BusMessage, BusMessageHandler, BusPublisher, BusSubscriber};
