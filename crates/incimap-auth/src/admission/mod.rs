//! Admission control for unauthenticated write endpoints.

pub mod limiter;

pub use limiter::AdmissionLimiter;
