//! Transaction config repository

use crate::domain::TransactionConfig;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionConfigRepository: Send + Sync {
    async fn find_by_provider_method(
        &self,
        provider_method_id: Uuid,
    ) -> Result<Vec<TransactionConfig>>;

    /// Insert or update configs keyed by (provider_method, currency, type)
    async fn upsert_many(&self, configs: &[TransactionConfig]) -> Result<()>;
}

pub struct TransactionConfigRepositoryImpl {
    pool: MySqlPool,
}

impl TransactionConfigRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionConfigRepository for TransactionConfigRepositoryImpl {
    async fn find_by_provider_method(
        &self,
        provider_method_id: Uuid,
    ) -> Result<Vec<TransactionConfig>> {
        let configs = sqlx::query_as::<_, TransactionConfig>(
            r#"
            SELECT id, provider_method_id, currency, transaction_type,
                   min_amount, max_amount, is_enabled, updated_at
            FROM transaction_configs
            WHERE provider_method_id = ?
            ORDER BY currency, transaction_type
            "#,
        )
        .bind(provider_method_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(configs)
    }

    async fn upsert_many(&self, configs: &[TransactionConfig]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for config in configs {
            sqlx::query(
                r#"
                INSERT INTO transaction_configs
                    (id, provider_method_id, currency, transaction_type,
                     min_amount, max_amount, is_enabled, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    min_amount = VALUES(min_amount),
                    max_amount = VALUES(max_amount),
                    is_enabled = VALUES(is_enabled),
                    updated_at = VALUES(updated_at)
                "#,
            )
            .bind(config.id)
            .bind(config.provider_method_id)
            .bind(&config.currency)
            .bind(config.transaction_type)
            .bind(config.min_amount)
            .bind(config.max_amount)
            .bind(config.is_enabled)
            .bind(config.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
