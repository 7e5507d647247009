//! Provider bank account repository

use crate::domain::{BankAccount, Scope, ScopedRecord};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

/// One bank account row as persisted
#[derive(Debug, Clone, FromRow)]
pub struct BankAccountRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub authority: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub accounts: Json<Vec<BankAccount>>,
}

impl BankAccountRow {
    pub fn into_record(self) -> ScopedRecord<Vec<BankAccount>> {
        ScopedRecord::new(
            Scope::new(
                self.authority.as_deref(),
                self.country.as_deref(),
                self.currency.as_deref(),
            ),
            self.accounts.0,
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BankAccountRepository: Send + Sync {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<BankAccountRow>>;

    /// Atomically replace all bank account rows of a provider
    async fn replace_for_provider(
        &self,
        provider_id: Uuid,
        records: &[ScopedRecord<Vec<BankAccount>>],
    ) -> Result<()>;
}

pub struct BankAccountRepositoryImpl {
    pool: MySqlPool,
}

impl BankAccountRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BankAccountRepository for BankAccountRepositoryImpl {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<BankAccountRow>> {
        let rows = sqlx::query_as::<_, BankAccountRow>(
            r#"
            SELECT id, provider_id, authority, country, currency, accounts
            FROM provider_bank_accounts
            WHERE provider_id = ?
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn replace_for_provider(
        &self,
        provider_id: Uuid,
        records: &[ScopedRecord<Vec<BankAccount>>],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM provider_bank_accounts WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO provider_bank_accounts
                    (id, provider_id, authority, country, currency, accounts)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(provider_id)
            .bind(&record.scope.authority)
            .bind(&record.scope.country)
            .bind(&record.scope.currency)
            .bind(Json(&record.payload))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
