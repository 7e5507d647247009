//! Provider credential repository

use crate::domain::{CredentialDetail, Scope, ScopedRecord};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

/// One credential row as persisted
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub authority: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub details: Json<Vec<CredentialDetail>>,
}

impl CredentialRow {
    pub fn into_record(self) -> ScopedRecord<Vec<CredentialDetail>> {
        ScopedRecord::new(
            Scope::new(
                self.authority.as_deref(),
                self.country.as_deref(),
                self.currency.as_deref(),
            ),
            self.details.0,
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<CredentialRow>>;

    /// Atomically replace all credential rows of a provider
    async fn replace_for_provider(
        &self,
        provider_id: Uuid,
        records: &[ScopedRecord<Vec<CredentialDetail>>],
    ) -> Result<()>;
}

pub struct CredentialRepositoryImpl {
    pool: MySqlPool,
}

impl CredentialRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepository for CredentialRepositoryImpl {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<CredentialRow>> {
        let rows = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, provider_id, authority, country, currency, details
            FROM provider_credentials
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
        records: &[ScopedRecord<Vec<CredentialDetail>>],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM provider_credentials WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO provider_credentials
                    (id, provider_id, authority, country, currency, details)
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
