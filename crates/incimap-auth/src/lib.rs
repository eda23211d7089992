//! # incimap-auth
//!
//! Session and admission control for Incimap.
//!
//! ## Modules
//!
//! - `jwt`: token claims, signing, and verification
//! - `revocation`: in-memory denylist of revoked refresh tokens
//! - `session`: the credential issuer (issue, verify, refresh, invalidate)
//! - `admission`: per-client minimum spacing for public write endpoints
//! - `maintenance`: owned periodic sweep tasks
//! - `password`: Argon2 password verification
//! - `directory`: config-seeded subject directory

pub mod admission;
pub mod directory;
pub mod jwt;
pub mod maintenance;
pub mod password;
pub mod revocation;
pub mod session;

pub use admission::AdmissionLimiter;
pub use directory::InMemorySubjectDirectory;
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPair, TokenType};
pub use maintenance::PeriodicTask;
pub use password::PasswordHasher;
pub use revocation::RevocationStore;
pub use session::CredentialIssuer;
