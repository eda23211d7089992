//! Core traits defined in `incimap-core` and implemented by other crates.

pub mod clock;
pub mod directory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::SubjectDirectory;
