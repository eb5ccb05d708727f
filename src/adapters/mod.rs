// Adapters layer: concrete implementations of the persistence port.

pub mod file;
pub mod memory;
