// Built-in storage backends

pub mod memory;

pub use memory::{InMemoryStorage, DEFAULT_MAX_SIZE};
