//! Currency repository

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{MySqlPool, QueryBuilder, Row};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CurrencyRepository: Send + Sync {
    /// Return the subset of the given codes that are known currencies
    async fn find_known_codes(&self, codes: &[String]) -> Result<Vec<String>>;
}

pub struct CurrencyRepositoryImpl {
    pool: MySqlPool,
}

impl CurrencyRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CurrencyRepository for CurrencyRepositoryImpl {
    async fn find_known_codes(&self, codes: &[String]) -> Result<Vec<String>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::new("SELECT code FROM currencies WHERE code IN (");
        let mut separated = query.separated(", ");
        for code in codes {
            separated.push_bind(code);
        }
        query.push(")");

        let rows = query.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("code"))
            .collect())
    }
}
