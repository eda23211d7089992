//! Subject directory backed by accounts listed in configuration.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use incimap_core::config::SeededUser;
use incimap_core::result::AppResult;
use incimap_core::traits::SubjectDirectory;
use incimap_core::types::Subject;

use crate::password::PasswordHasher;

/// In-memory [`SubjectDirectory`] for single-node deployments and tests.
///
/// Emails are matched case-insensitively. A lookup for an unknown email
/// still runs one Argon2 verification, so both paths cost the same.
#[derive(Debug, Clone)]
pub struct InMemorySubjectDirectory {
    /// Lower-cased email → (subject, password hash).
    accounts: HashMap<String, (Subject, String)>,
    /// Hash verified against on a miss.
    decoy_hash: Option<String>,
    /// Password verifier.
    hasher: PasswordHasher,
}

/// Plaintext behind the decoy hash. Never a valid login.
const DECOY_PASSWORD: &str = "incimap-unknown-account";

impl InMemorySubjectDirectory {
    /// Builds the directory from seeded accounts. Later duplicates of an
    /// email replace earlier ones.
    pub fn new(users: &[SeededUser]) -> Self {
        let accounts = users
            .iter()
            .map(|u| {
                (
                    u.email.to_lowercase(),
                    (Subject::new(&u.id, &u.email), u.password_hash.clone()),
                )
            })
            .collect();

        let hasher = PasswordHasher::new();
        let decoy_hash = match hasher.hash_password(DECOY_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(error = %e, "Could not prepare decoy hash for unknown accounts");
                None
            }
        };

        Self {
            accounts,
            decoy_hash,
            hasher,
        }
    }

    /// Number of known accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` when no account is configured.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl SubjectDirectory for InMemorySubjectDirectory {
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<Option<Subject>> {
        let Some((subject, hash)) = self.accounts.get(&email.to_lowercase()) else {
            if let Some(decoy) = &self.decoy_hash {
                let _ = self.hasher.verify_password(password, decoy);
            }
            return Ok(None);
        };

        match self.hasher.verify_password(password, hash) {
            Ok(true) => Ok(Some(subject.clone())),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!(subject = %subject.id, error = %e, "Stored password hash is unusable");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemorySubjectDirectory {
        let hash = PasswordHasher::new().hash_password("hunter22").expect("hash");
        InMemorySubjectDirectory::new(&[
            SeededUser {
                id: "u-1".to_string(),
                email: "Ana@Example.com".to_string(),
                password_hash: hash,
            },
            SeededUser {
                id: "u-2".to_string(),
                email: "broken@example.com".to_string(),
                password_hash: "plaintext".to_string(),
            },
        ])
    }

    #[tokio::test]
    async fn test_authenticate_matches_email_case_insensitively() {
        let dir = directory();
        let subject = dir
            .authenticate("ana@example.com", "hunter22")
            .await
            .expect("lookup")
            .expect("match");
        assert_eq!(subject, Subject::new("u-1", "Ana@Example.com"));
    }

    #[test]
    fn test_decoy_hash_is_verifiable() {
        let dir = directory();
        let decoy = dir.decoy_hash.as_deref().expect("decoy hash");
        assert!(decoy.starts_with("$argon2id$"));
        assert!(!dir.hasher.verify_password("hunter22", decoy).expect("verify"));
    }

    #[tokio::test]
    async fn test_unknown_account_is_rejected_like_bad_password() {
        let dir = directory();
        for password in ["hunter22", "", DECOY_PASSWORD] {
            assert!(
                dir.authenticate("ghost@example.com", password)
                    .await
                    .expect("lookup")
                    .is_none()
            );
        }
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_input() {
        let dir = directory();
        assert!(dir.authenticate("ana@example.com", "wrong").await.expect("lookup").is_none());
        assert!(dir.authenticate("nobody@example.com", "hunter22").await.expect("lookup").is_none());
        assert!(dir.authenticate("broken@example.com", "plaintext").await.expect("lookup").is_none());
    }
}
