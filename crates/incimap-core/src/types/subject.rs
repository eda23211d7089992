//! The identity carried inside session credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An authenticated user as seen by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    /// Opaque user identifier.
    pub id: String,
    /// Email address, denormalized into every credential.
    pub email: String,
}

impl Subject {
    /// Creates a new subject.
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.id, self.email)
    }
}
