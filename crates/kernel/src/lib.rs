//! Shared kernel for the SSF event hub.
//!
//! Holds the primitives every bounded context depends on but none of
//! them owns: ID generation (spec §4.9 / C9), a clock seam, and the
//! unified bus port (spec §6.3) plus an in-memory adapter for tests.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::ports::{Ack, Bus, BusError, BusMessage, BusMessageHandler, BusPublisher, BusSubscriber};
pub use domain::{
    Clock, IdGenerator, RandomEncoding, RandomGenerator, SequentialGenerator, ShutdownToken,
    SystemClock, TimestampGenerator, UuidGenerator,
};
pub use infrastructure::InMemoryBus;
