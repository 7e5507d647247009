//! Straight-through-processing rule repository
//!
//! STP rules are scoped by country-authority only, never by currency.

use crate::domain::{Scope, ScopedRecord, StpRule};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct StpRuleRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub authority: Option<String>,
    pub country: Option<String>,
    pub rules: Json<Vec<StpRule>>,
}

impl StpRuleRow {
    pub fn into_record(self) -> ScopedRecord<Vec<StpRule>> {
        ScopedRecord::new(
            Scope::new(self.authority.as_deref(), self.country.as_deref(), None),
            self.rules.0,
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StpRuleRepository: Send + Sync {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<StpRuleRow>>;

    async fn replace_for_provider(
        &self,
        provider_id: Uuid,
        records: &[ScopedRecord<Vec<StpRule>>],
    ) -> Result<()>;
}

pub struct StpRuleRepositoryImpl {
    pool: MySqlPool,
}

impl StpRuleRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StpRuleRepository for StpRuleRepositoryImpl {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<StpRuleRow>> {
        let rows = sqlx::query_as::<_, StpRuleRow>(
            r#"
            SELECT id, provider_id, authority, country, rules
            FROM provider_stp_rules
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
        records: &[ScopedRecord<Vec<StpRule>>],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM provider_stp_rules WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO provider_stp_rules
                    (id, provider_id, authority, country, rules)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(provider_id)
            .bind(&record.scope.authority)
            .bind(&record.scope.country)
            .bind(Json(&record.payload))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
