//! In-memory account store. Data is lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;

use super::{Account, AccountStore, StoreError};

/// Accounts keyed by federated identity.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, mostly for tests.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|account| (account.federated_identity_id.clone(), account))
            .collect();
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    /// Copy of every stored account, ordered by federated identity.
    pub async fn snapshot(&self) -> Vec<Account> {
        let accounts = self.accounts.lock().await;
        let mut snapshot: Vec<Account> = accounts.values().cloned().collect();
        snapshot.sort_by(|a, b| a.federated_identity_id.cmp(&b.federated_identity_id));
        snapshot
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_federated_identity(
        &self,
        federated_identity_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.get(federated_identity_id).cloned())
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.lock().await;
        let stored = accounts
            .entry(account.federated_identity_id.clone())
            .or_insert_with(|| {
                info!(account_id = %account.account_id, "creating account");
                account
            });
        Ok(stored.clone())
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().await;

        let previous_key = accounts
            .iter()
            .find(|(_, stored)| stored.account_id == account.account_id)
            .map(|(key, _)| key.clone())
            .ok_or(StoreError::NotFound(account.account_id))?;

        let Some(mut stored) = accounts.remove(&previous_key) else {
            return Err(StoreError::NotFound(account.account_id));
        };
        stored.federated_identity_id = account.federated_identity_id.clone();
        stored.directory_username = account.directory_username.clone();
        accounts.insert(stored.federated_identity_id.clone(), stored);

        Ok(())
    }
}
