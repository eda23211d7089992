//! Subject lookup used by the login flow.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::Subject;

/// Resolves login credentials to a subject identity.
///
/// Implemented by the persistence layer; the core only needs the answer.
#[async_trait]
pub trait SubjectDirectory: Send + Sync + 'static {
    /// Returns the subject when `email` and `password` match a known account,
    /// `Ok(None)` when they do not.
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<Option<Subject>>;
}
