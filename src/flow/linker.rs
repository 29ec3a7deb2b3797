//! Find-or-create the local account for a federated identity.

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::accounts::{Account, AccountStore, StoreError};

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("account {0} is blacklisted")]
    Blacklisted(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Upsert keyed by federated identity: a user may sign in under a different
/// directory username over time and stay linked to the same account.
///
/// # Errors
/// [`LinkError::Blacklisted`] when the identity's account is blacklisted (the
/// store is left untouched), [`LinkError::Store`] for backend failures.
#[instrument(skip(store))]
pub async fn link(
    store: &dyn AccountStore,
    federated_identity_id: &str,
    directory_username: &str,
) -> Result<Account, LinkError> {
    if let Some(mut account) = store.find_by_federated_identity(federated_identity_id).await? {
        if account.blacklisted {
            warn!(account_id = %account.account_id, "blacklisted account attempted to sign in");
            return Err(LinkError::Blacklisted(account.account_id));
        }

        if account.directory_username != directory_username {
            info!(account_id = %account.account_id, "updating directory username mapping");
            account.directory_username = directory_username.to_string();
            store.update(&account).await?;
        }

        return Ok(account);
    }

    let account = store
        .create(Account::new(federated_identity_id, directory_username))
        .await?;

    // Another attempt may have created (or blacklisted) the record first.
    if account.blacklisted {
        return Err(LinkError::Blacklisted(account.account_id));
    }
    if account.directory_username != directory_username {
        let mut account = account;
        account.directory_username = directory_username.to_string();
        store.update(&account).await?;
        return Ok(account);
    }

    Ok(account)
}
