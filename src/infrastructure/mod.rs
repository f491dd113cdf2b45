//! Concrete implementations of the domain ports.

pub mod horizon;
pub mod in_memory;
