//! Credential storage.
//!
//! Accounts live in memory for the lifetime of the process. Passwords are
//! compared in plaintext; this is a demo login, not an identity system.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::AccountError;

/// Accounts seeded at startup unless disabled.
pub const DEMO_ACCOUNTS: [(&str, &str); 2] = [("admin", "1234"), ("mrinmoy", "pass123")];

/// Repository of username/password records.
pub trait AccountStore: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// [`AccountError::MissingCredentials`] when either field is empty,
    /// [`AccountError::Conflict`] when the username is taken. A conflicting
    /// call leaves the existing record untouched.
    fn register(&self, username: &str, password: &str) -> Result<(), AccountError>;

    /// Check that `username` exists with exactly this `password`.
    fn verify(&self, username: &str, password: &str) -> Result<(), AccountError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<String, String>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_accounts() -> Self {
        let accounts = DEMO_ACCOUNTS
            .iter()
            .map(|(user, pass)| ((*user).to_owned(), (*pass).to_owned()))
            .collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }
}

impl AccountStore for InMemoryAccountStore {
    fn register(&self, username: &str, password: &str) -> Result<(), AccountError> {
        if username.is_empty() || password.is_empty() {
            return Err(AccountError::MissingCredentials);
        }

        let mut accounts = self
            .accounts
            .write()
            .expect("account store lock is not poisoned");
        if accounts.contains_key(username) {
            return Err(AccountError::Conflict {
                username: username.to_owned(),
            });
        }
        accounts.insert(username.to_owned(), password.to_owned());
        Ok(())
    }

    fn verify(&self, username: &str, password: &str) -> Result<(), AccountError> {
        let accounts = self
            .accounts
            .read()
            .expect("account store lock is not poisoned");
        match accounts.get(username) {
            Some(stored) if stored == password => Ok(()),
            _ => Err(AccountError::Authentication),
        }
    }

    fn len(&self) -> usize {
        self.accounts
            .read()
            .expect("account store lock is not poisoned")
            .len()
    }
}
