use crate::domain::{AccountDirectory, AccountError, AccountId, NewAccount, OrderId, OrderStore};
use crate::security::{generate_strong_password, DEFAULT_PASSWORD_LENGTH};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Account creation failed: {0}")]
    Account(#[from] AccountError),

    #[error("Order {0} disappeared while binding its customer")]
    OrderMissing(OrderId),

    #[error("No free login derived from {0}")]
    LoginUnavailable(String),
}

const MAX_CREATE_ATTEMPTS: usize = 5;

/// How the order's customer was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerResolution {
    /// Billing email was blank; nothing to do.
    Skipped,
    /// An account with the billing email already existed.
    Existing(AccountId),
    /// A new account was created for the billing email.
    Created(AccountId),
}

impl CustomerResolution {
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            CustomerResolution::Skipped => None,
            CustomerResolution::Existing(id) | CustomerResolution::Created(id) => Some(*id),
        }
    }
}

/// Finds or creates the account behind an order's billing email and binds
/// the order to it.
pub struct CustomerResolver {
    directory: Arc<dyn AccountDirectory>,
    orders: Arc<OrderStore>,
}

impl CustomerResolver {
    pub fn new(directory: Arc<dyn AccountDirectory>, orders: Arc<OrderStore>) -> Self {
        Self { directory, orders }
    }

    pub async fn resolve(
        &self,
        order_id: OrderId,
        billing_email: &str,
    ) -> Result<CustomerResolution, ResolveError> {
        let billing_email = billing_email.trim();
        if billing_email.is_empty() {
            debug!("Order {} has no billing email, skipping customer", order_id);
            return Ok(CustomerResolution::Skipped);
        }

        let resolution = match self.directory.find_by_email(billing_email).await {
            Some(account) => {
                debug!("Order {} matches existing account {}", order_id, account.id);
                CustomerResolution::Existing(account.id)
            }
            None => self.create_customer(order_id, billing_email).await?,
        };

        if let Some(account_id) = resolution.account_id() {
            self.orders
                .update(order_id, |order| order.bind_customer(account_id))
                .await
                .ok_or(ResolveError::OrderMissing(order_id))?;
        }

        Ok(resolution)
    }

    /// Create the account, settling races with concurrent creators: a lost
    /// email race binds the winner's account, a lost login race moves on to
    /// the next suffix.
    async fn create_customer(
        &self,
        order_id: OrderId,
        email: &str,
    ) -> Result<CustomerResolution, ResolveError> {
        let base = login_from_email(email);
        let mut suffix = 0;

        for _ in 0..MAX_CREATE_ATTEMPTS {
            let (login, used) = self.unique_login(&base, suffix).await;
            let created = self
                .directory
                .create_account(NewAccount {
                    login,
                    email: email.to_string(),
                    password: generate_strong_password(DEFAULT_PASSWORD_LENGTH),
                    notify: false,
                })
                .await;

            match created {
                Ok(account) => {
                    info!(
                        order_id,
                        account_id = account.id,
                        login = %account.login,
                        "Created customer account for order"
                    );
                    return Ok(CustomerResolution::Created(account.id));
                }
                Err(AccountError::EmailExists(existing)) => {
                    debug!("Account for {} created concurrently, binding it", existing);
                    return match self.directory.find_by_email(email).await {
                        Some(account) => Ok(CustomerResolution::Existing(account.id)),
                        None => Err(AccountError::EmailExists(existing).into()),
                    };
                }
                Err(AccountError::LoginExists(taken)) => {
                    debug!("Login {} taken concurrently, retrying", taken);
                    suffix = used + 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ResolveError::LoginUnavailable(base))
    }

    /// First free login at or after `start`: the base itself for 0, then
    /// `base_1`, `base_2`, ... Returns the login and the suffix it used.
    async fn unique_login(&self, base: &str, start: u32) -> (String, u32) {
        let mut suffix = start;
        let mut candidate = login_with_suffix(base, suffix);

        while self.directory.login_exists(&candidate).await {
            suffix += 1;
            candidate = login_with_suffix(base, suffix);
        }

        if suffix > 0 {
            warn!("Login {} taken, using {}", base, candidate);
        }
        (candidate, suffix)
    }
}

fn login_with_suffix(base: &str, suffix: u32) -> String {
    if suffix == 0 {
        base.to_string()
    } else {
        format!("{}_{}", base, suffix)
    }
}

/// `@` becomes `_`; anything outside `[A-Za-z0-9_.-]` is dropped.
pub fn login_from_email(email: &str) -> String {
    email
        .trim()
        .replace('@', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}
