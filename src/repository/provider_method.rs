//! Provider method repository

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ProviderMethodLookup {
    pub id: Uuid,
    pub is_enabled: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderMethodRepository: Send + Sync {
    /// Resolve the provider method binding a provider to a method under one
    /// country-authority.
    async fn find_binding(
        &self,
        provider_id: Uuid,
        country: &str,
        authority: &str,
        method_code: &str,
    ) -> Result<Option<ProviderMethodLookup>>;
}

pub struct ProviderMethodRepositoryImpl {
    pool: MySqlPool,
}

impl ProviderMethodRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderMethodRepository for ProviderMethodRepositoryImpl {
    async fn find_binding(
        &self,
        provider_id: Uuid,
        country: &str,
        authority: &str,
        method_code: &str,
    ) -> Result<Option<ProviderMethodLookup>> {
        let row = sqlx::query_as::<_, ProviderMethodLookup>(
            r#"
            SELECT pm.id, pm.is_enabled
            FROM provider_methods pm
            INNER JOIN country_authority_methods cam ON cam.id = pm.country_authority_method_id
            INNER JOIN country_authorities ca ON ca.id = cam.country_authority_id
            INNER JOIN methods m ON m.id = cam.method_id
            WHERE pm.provider_id = ?
              AND ca.country = ?
              AND ca.authority = ?
              AND m.code = ?
            "#,
        )
        .bind(provider_id)
        .bind(country)
        .bind(authority)
        .bind(method_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
