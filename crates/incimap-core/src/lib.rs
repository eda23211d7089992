//! # incimap-core
//!
//! Core crate for Incimap. Contains configuration schemas, the clock
//! abstraction, subject identity types, collaborator traits, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Incimap crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
