pub mod in_memory_bus;

pub use in_memory_bus::InMemoryBus;
