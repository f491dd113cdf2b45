//! Adapters between the domain and file formats.

pub mod csv;
pub mod json;
