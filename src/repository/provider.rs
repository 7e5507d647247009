//! Provider repository

use crate::domain::Provider;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Provider>>;
}

pub struct ProviderRepositoryImpl {
    pool: MySqlPool,
}

impl ProviderRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProviderRepository for ProviderRepositoryImpl {
    async fn find_by_code(&self, code: &str) -> Result<Option<Provider>> {
        let provider = sqlx::query_as::<_, Provider>(
            r#"
            SELECT id, code, name, is_enabled, created_at, updated_at
            FROM providers
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(provider)
    }
}
