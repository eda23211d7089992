//! Built-in subject directory implementations.

pub mod memory;

pub use memory::InMemorySubjectDirectory;
