//! Platform restriction repository
//!
//! Restrictions are scoped by country-authority only, never by currency.

use crate::domain::{PlatformRestriction, Scope, ScopedRecord};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct RestrictionRow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub authority: Option<String>,
    pub country: Option<String>,
    pub platforms: Json<Vec<PlatformRestriction>>,
}

impl RestrictionRow {
    pub fn into_record(self) -> ScopedRecord<Vec<PlatformRestriction>> {
        ScopedRecord::new(
            Scope::new(self.authority.as_deref(), self.country.as_deref(), None),
            self.platforms.0,
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestrictionRepository: Send + Sync {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<RestrictionRow>>;

    async fn replace_for_provider(
        &self,
        provider_id: Uuid,
        records: &[ScopedRecord<Vec<PlatformRestriction>>],
    ) -> Result<()>;
}

pub struct RestrictionRepositoryImpl {
    pool: MySqlPool,
}

impl RestrictionRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RestrictionRepository for RestrictionRepositoryImpl {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<RestrictionRow>> {
        let rows = sqlx::query_as::<_, RestrictionRow>(
            r#"
            SELECT id, provider_id, authority, country, platforms
            FROM provider_restrictions
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
        records: &[ScopedRecord<Vec<PlatformRestriction>>],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM provider_restrictions WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO provider_restrictions
                    (id, provider_id, authority, country, platforms)
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
