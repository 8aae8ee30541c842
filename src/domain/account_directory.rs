use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{is_plausible_email, normalize_email, AccountId, UserAccount};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("An account is already registered with {0}")]
    EmailExists(String),

    #[error("Login already taken: {0}")]
    LoginExists(String),

    #[error("Login cannot be empty")]
    EmptyLogin,
}

/// Request to register an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login: String,
    pub email: String,
    pub password: String,
    /// Emit the welcome notification for this account
    pub notify: bool,
}

/// Welcome message the directory would deliver for a new account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountNotification {
    pub account_id: AccountId,
    pub email: String,
}

/// User accounts of the commerce host.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Look up by email, ignoring case and surrounding whitespace.
    async fn find_by_email(&self, email: &str) -> Option<UserAccount>;

    async fn login_exists(&self, login: &str) -> bool;

    async fn create_account(&self, account: NewAccount) -> Result<UserAccount, AccountError>;
}

#[derive(Default)]
struct DirectoryState {
    accounts: HashMap<AccountId, UserAccount>,
    by_email: HashMap<String, AccountId>,
    by_login: HashMap<String, AccountId>,
    notifications: Vec<AccountNotification>,
    next_id: AccountId,
}

pub struct InMemoryAccountDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DirectoryState {
                next_id: 1,
                ..DirectoryState::default()
            }),
        }
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.accounts.len()
    }

    /// Notifications emitted so far
    pub async fn notifications(&self) -> Vec<AccountNotification> {
        self.state.read().await.notifications.clone()
    }
}

impl Default for InMemoryAccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_by_email(&self, email: &str) -> Option<UserAccount> {
        let state = self.state.read().await;
        let id = state.by_email.get(&normalize_email(email))?;
        state.accounts.get(id).cloned()
    }

    async fn login_exists(&self, login: &str) -> bool {
        self.state.read().await.by_login.contains_key(login)
    }

    async fn create_account(&self, account: NewAccount) -> Result<UserAccount, AccountError> {
        if account.login.is_empty() {
            return Err(AccountError::EmptyLogin);
        }
        if !is_plausible_email(&account.email) {
            return Err(AccountError::InvalidEmail(account.email));
        }

        let email_key = normalize_email(&account.email);
        let mut state = self.state.write().await;

        if state.by_email.contains_key(&email_key) {
            return Err(AccountError::EmailExists(account.email));
        }
        if state.by_login.contains_key(&account.login) {
            return Err(AccountError::LoginExists(account.login));
        }

        let id = state.next_id;
        state.next_id += 1;

        let user = UserAccount {
            id,
            login: account.login.clone(),
            email: account.email.trim().to_string(),
            password_digest: format!("{:x}", Sha256::digest(account.password.as_bytes())),
            created_at: Utc::now(),
        };

        state.by_email.insert(email_key, id);
        state.by_login.insert(account.login, id);
        state.accounts.insert(id, user.clone());

        if account.notify {
            state.notifications.push(AccountNotification {
                account_id: id,
                email: user.email.clone(),
            });
            debug!("Queued welcome notification for account {}", id);
        }

        info!(account_id = id, login = %user.login, "Account created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(login: &str, email: &str, notify: bool) -> NewAccount {
        NewAccount {
            login: login.to_string(),
            email: email.to_string(),
            password: "Secret#123abc".to_string(),
            notify,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_email_case_insensitive() {
        let directory = InMemoryAccountDirectory::new();
        let created = directory
            .create_account(new_account("a_b.com", "A@B.com", false))
            .await
            .unwrap();

        let found = directory.find_by_email(" a@b.COM ").await.unwrap();
        assert_eq!(found.id, created.id);
        assert!(directory.login_exists("a_b.com").await);
        assert_ne!(found.password_digest, "Secret#123abc");
        assert_eq!(found.password_digest.len(), 64);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let directory = InMemoryAccountDirectory::new();
        directory
            .create_account(new_account("first", "a@b.com", false))
            .await
            .unwrap();

        let err = directory
            .create_account(new_account("second", "A@b.com", false))
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::EmailExists(_)));
        assert_eq!(directory.count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_login_rejected() {
        let directory = InMemoryAccountDirectory::new();
        directory
            .create_account(new_account("same", "a@b.com", false))
            .await
            .unwrap();

        let err = directory
            .create_account(new_account("same", "c@d.com", false))
            .await
            .unwrap_err();
        assert_eq!(err, AccountError::LoginExists("same".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let directory = InMemoryAccountDirectory::new();
        let err = directory
            .create_account(new_account("x", "not-an-email", false))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_notifications_only_when_requested() {
        let directory = InMemoryAccountDirectory::new();
        directory
            .create_account(new_account("quiet", "q@b.com", false))
            .await
            .unwrap();
        assert!(directory.notifications().await.is_empty());

        let loud = directory
            .create_account(new_account("loud", "l@b.com", true))
            .await
            .unwrap();
        assert_eq!(
            directory.notifications().await,
            vec![AccountNotification {
                account_id: loud.id,
                email: "l@b.com".to_string(),
            }]
        );
    }
}
