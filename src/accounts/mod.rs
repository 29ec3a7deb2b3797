//! Local account records linking a federated identity to a directory username.
//!
//! Two backends implement [`AccountStore`]:
//! - [`MemoryAccountStore`] keeps records in process memory and is used by
//!   tests and by servers started without a database DSN.
//! - [`PostgresAccountStore`] persists records in the `accounts` table
//!   (`sql/schema.sql`).
//!
//! Concurrent attempts for the same newly federated identity race between the
//! lookup and the insert. Stores resolve that race inside [`AccountStore::create`]:
//! the insert is atomic per `federated_identity_id` and returns whichever record
//! won.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAccountStore;
pub use postgres::PostgresAccountStore;

use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("account not found: {0}")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub account_id: Uuid,
    pub federated_identity_id: String,
    pub directory_username: String,
    pub blacklisted: bool,
}

impl Account {
    /// New, non-blacklisted account with a fresh id.
    #[must_use]
    pub fn new(federated_identity_id: &str, directory_username: &str) -> Self {
        Self {
            account_id: Uuid::new_v4(),
            federated_identity_id: federated_identity_id.to_string(),
            directory_username: directory_username.to_string(),
            blacklisted: false,
        }
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync + Debug {
    async fn find_by_federated_identity(
        &self,
        federated_identity_id: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Insert `account`, or return the record already linked to its
    /// federated identity if another writer got there first.
    async fn create(&self, account: Account) -> Result<Account, StoreError>;

    /// Rewrite the identity and username mapping of an existing account.
    async fn update(&self, account: &Account) -> Result<(), StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
