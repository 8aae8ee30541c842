use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type AccountId = u64;

/// A store user account. Only a digest of the password is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: AccountId,
    pub login: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical form used for email lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Minimal shape check: one `@` with something on both sides and a dot in
/// the domain.
pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
