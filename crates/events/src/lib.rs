//! Event taxonomy (spec §3.2 / C2): the registry of CAEP/RISC/SSF event
//! kinds keyed by URI, each with a payload shape and validation rule.

pub mod error;
pub mod event;
pub mod kinds;
pub mod registry;
pub mod uris;

pub use error::EventError;
pub use event::Event;
pub use registry::{global_registry, EventRegistry, Validator};
