//! Postgres account store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::time::Duration;
use tracing::Instrument;

use super::{Account, AccountStore, StoreError};

const ACCOUNT_COLUMNS: &str = "account_id, federated_identity_id, directory_username, blacklisted";

#[derive(Clone, Debug)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a small connection pool against `dsn`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }
}

fn db_span(operation: &'static str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        account_id: row.get("account_id"),
        federated_identity_id: row.get("federated_identity_id"),
        directory_username: row.get("directory_username"),
        blacklisted: row.get("blacklisted"),
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn find_by_federated_identity(
        &self,
        federated_identity_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE federated_identity_id = $1");
        let row = sqlx::query(&query)
            .bind(federated_identity_id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        // A concurrent insert for the same identity leaves no returned row.
        let query = format!(
            "INSERT INTO accounts ({ACCOUNT_COLUMNS}) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (federated_identity_id) DO NOTHING \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(account.account_id)
            .bind(&account.federated_identity_id)
            .bind(&account.directory_username)
            .bind(account.blacklisted)
            .fetch_optional(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await?;

        if let Some(row) = row {
            return Ok(account_from_row(&row));
        }

        self.find_by_federated_identity(&account.federated_identity_id)
            .await?
            .ok_or(StoreError::NotFound(account.account_id))
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let query = r"
            UPDATE accounts
            SET federated_identity_id = $2,
                directory_username = $3,
                updated_at = NOW()
            WHERE account_id = $1
        ";
        let result = sqlx::query(query)
            .bind(account.account_id)
            .bind(&account.federated_identity_id)
            .bind(&account.directory_username)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(account.account_id));
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let query = "SELECT 1";
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;
        Ok(())
    }
}
