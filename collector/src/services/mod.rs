//! Collector services implementations

pub mod file_storage;
pub mod http_api;
pub mod memory_storage;

#[cfg(test)]
pub mod tests;

pub use file_storage::*;
pub use http_api::*;
pub use memory_storage::*;
