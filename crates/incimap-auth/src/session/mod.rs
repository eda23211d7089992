//! Session credential issuance and verification.

pub mod issuer;

pub use issuer::{CredentialIssuer, UNAUTHORIZED};
