//! Country-authority repository

use crate::domain::CountryAuthorityRow;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CountryAuthorityRepository: Send + Sync {
    /// Country-authorities currently bound to a provider through its
    /// provider methods
    async fn find_bound_to_provider(&self, provider_id: Uuid) -> Result<Vec<CountryAuthorityRow>>;
}

pub struct CountryAuthorityRepositoryImpl {
    pool: MySqlPool,
}

impl CountryAuthorityRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CountryAuthorityRepository for CountryAuthorityRepositoryImpl {
    async fn find_bound_to_provider(&self, provider_id: Uuid) -> Result<Vec<CountryAuthorityRow>> {
        let rows = sqlx::query_as::<_, CountryAuthorityRow>(
            r#"
            SELECT DISTINCT ca.id, ca.country, ca.authority
            FROM country_authorities ca
            INNER JOIN country_authority_methods cam ON cam.country_authority_id = ca.id
            INNER JOIN provider_methods pm ON pm.country_authority_method_id = cam.id
            WHERE pm.provider_id = ?
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
