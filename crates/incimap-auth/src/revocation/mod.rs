//! Server-side revocation of issued tokens.

pub mod store;

pub use store::RevocationStore;
