//! Transactional unit of work for config reconciliation
//!
//! The upsert processor and cleaner run every statement against one
//! database transaction so a failed reconciliation never leaves a partial
//! mapping behind. Dropping an uncommitted [`ConfigTx`] rolls it back.

use crate::domain::{
    CountryAuthority, CountryAuthorityMethod, CountryAuthorityRow, Method,
    NewCountryAuthorityMethod, NewProviderMethod, Provider, ProviderInput, ProviderMethod,
};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::mysql::MySqlConnection;
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigUnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn ConfigTx>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigTx: Send {
    /// Create or update the provider row, matched by code. Uniqueness of
    /// the code column is the safety net against concurrent creates.
    async fn upsert_provider(&mut self, input: &ProviderInput) -> Result<Provider>;

    async fn find_country_authorities(
        &mut self,
        pairs: &[(String, String)],
    ) -> Result<Vec<CountryAuthorityRow>>;

    async fn find_methods(&mut self, codes: &[String]) -> Result<Vec<Method>>;

    async fn find_country_authority_methods(
        &mut self,
        country_authority_ids: &[Uuid],
        method_ids: &[Uuid],
    ) -> Result<Vec<CountryAuthorityMethod>>;

    async fn insert_country_authority_methods(
        &mut self,
        rows: &[NewCountryAuthorityMethod],
    ) -> Result<()>;

    async fn find_provider_methods(&mut self, provider_id: Uuid) -> Result<Vec<ProviderMethod>>;

    async fn insert_provider_methods(&mut self, rows: &[NewProviderMethod]) -> Result<()>;

    async fn delete_transaction_configs(&mut self, provider_method_ids: &[Uuid]) -> Result<u64>;

    async fn delete_provider_methods(&mut self, provider_method_ids: &[Uuid]) -> Result<u64>;

    async fn delete_method_fields(&mut self, provider_method_ids: &[Uuid]) -> Result<u64>;

    async fn delete_credentials_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64>;

    async fn delete_bank_accounts_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64>;

    async fn delete_stp_rules_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64>;

    async fn delete_restrictions_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64>;

    async fn delete_provider_fields_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64>;

    async fn commit(&mut self) -> Result<()>;
}

pub struct MySqlConfigUnitOfWork {
    pool: MySqlPool,
}

impl MySqlConfigUnitOfWork {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigUnitOfWork for MySqlConfigUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn ConfigTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlConfigTx { tx: Some(tx) }))
    }
}

pub struct MySqlConfigTx {
    // Consumed by commit; a remaining transaction rolls back on drop
    tx: Option<Transaction<'static, MySql>>,
}

impl MySqlConfigTx {
    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| anyhow::anyhow!("transaction already completed").into())
    }

    /// Scoped config tables share a shape: wildcard rows (null authority)
    /// always survive, country-pinned rows survive only if their pair is
    /// still bound, authority-only rows survive if any surviving pair has
    /// that authority.
    async fn delete_scoped_not_bound(
        &mut self,
        table: &str,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64> {
        let pairs: Vec<(String, String)> = surviving
            .iter()
            .filter_map(|ca| {
                ca.country
                    .as_ref()
                    .map(|country| (country.clone(), ca.authority.clone()))
            })
            .collect();
        let authorities: Vec<String> = {
            let mut seen = Vec::new();
            for ca in surviving {
                if !seen.contains(&ca.authority) {
                    seen.push(ca.authority.clone());
                }
            }
            seen
        };

        let mut query = QueryBuilder::new("DELETE FROM ");
        query.push(table);
        query.push(" WHERE provider_id = ");
        query.push_bind(provider_id);
        query.push(" AND authority IS NOT NULL AND (");

        query.push("(country IS NOT NULL");
        if !pairs.is_empty() {
            query.push(" AND (country, authority) NOT IN ");
            query.push_tuples(&pairs, |mut b, (country, authority)| {
                b.push_bind(country).push_bind(authority);
            });
        }
        query.push(")");

        query.push(" OR (country IS NULL");
        if !authorities.is_empty() {
            query.push(" AND authority NOT IN (");
            let mut separated = query.separated(", ");
            for authority in &authorities {
                separated.push_bind(authority);
            }
            query.push(")");
        }
        query.push("))");

        let result = query.build().execute(self.conn()?).await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_ids(&mut self, sql_prefix: &str, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut query = QueryBuilder::new(sql_prefix);
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        query.push(")");

        let result = query.build().execute(self.conn()?).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ConfigTx for MySqlConfigTx {
    async fn upsert_provider(&mut self, input: &ProviderInput) -> Result<Provider> {
        sqlx::query(
            r#"
            INSERT INTO providers (id, code, name, is_enabled)
            VALUES (?, ?, ?, FALSE)
            ON DUPLICATE KEY UPDATE name = VALUES(name)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.code)
        .bind(&input.name)
        .execute(self.conn()?)
        .await?;

        let provider = sqlx::query_as::<_, Provider>(
            r#"
            SELECT id, code, name, is_enabled, created_at, updated_at
            FROM providers
            WHERE code = ?
            "#,
        )
        .bind(&input.code)
        .fetch_one(self.conn()?)
        .await?;

        Ok(provider)
    }

    async fn find_country_authorities(
        &mut self,
        pairs: &[(String, String)],
    ) -> Result<Vec<CountryAuthorityRow>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::new(
            "SELECT id, country, authority FROM country_authorities WHERE (country, authority) IN ",
        );
        query.push_tuples(pairs, |mut b, (country, authority)| {
            b.push_bind(country).push_bind(authority);
        });

        let rows = query
            .build_query_as::<CountryAuthorityRow>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(rows)
    }

    async fn find_methods(&mut self, codes: &[String]) -> Result<Vec<Method>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::new("SELECT id, code, name FROM methods WHERE code IN (");
        let mut separated = query.separated(", ");
        for code in codes {
            separated.push_bind(code);
        }
        query.push(")");

        let methods = query
            .build_query_as::<Method>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(methods)
    }

    async fn find_country_authority_methods(
        &mut self,
        country_authority_ids: &[Uuid],
        method_ids: &[Uuid],
    ) -> Result<Vec<CountryAuthorityMethod>> {
        if country_authority_ids.is_empty() || method_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::new(
            "SELECT id, method_id, country_authority_id, is_enabled, deposits_order \
             FROM country_authority_methods WHERE country_authority_id IN (",
        );
        let mut separated = query.separated(", ");
        for id in country_authority_ids {
            separated.push_bind(id);
        }
        query.push(") AND method_id IN (");
        let mut separated = query.separated(", ");
        for id in method_ids {
            separated.push_bind(id);
        }
        query.push(")");

        let rows = query
            .build_query_as::<CountryAuthorityMethod>()
            .fetch_all(self.conn()?)
            .await?;
        Ok(rows)
    }

    async fn insert_country_authority_methods(
        &mut self,
        rows: &[NewCountryAuthorityMethod],
    ) -> Result<()> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO country_authority_methods
                    (id, method_id, country_authority_id, is_enabled, deposits_order)
                VALUES (?, ?, ?, FALSE, 0)
                "#,
            )
            .bind(row.id)
            .bind(row.method_id)
            .bind(row.country_authority_id)
            .execute(self.conn()?)
            .await?;
        }
        Ok(())
    }

    async fn find_provider_methods(&mut self, provider_id: Uuid) -> Result<Vec<ProviderMethod>> {
        let rows = sqlx::query_as::<_, ProviderMethod>(
            r#"
            SELECT id, provider_id, country_authority_method_id, is_enabled
            FROM provider_methods
            WHERE provider_id = ?
            "#,
        )
        .bind(provider_id)
        .fetch_all(self.conn()?)
        .await?;
        Ok(rows)
    }

    async fn insert_provider_methods(&mut self, rows: &[NewProviderMethod]) -> Result<()> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO provider_methods
                    (id, provider_id, country_authority_method_id, is_enabled)
                VALUES (?, ?, ?, FALSE)
                "#,
            )
            .bind(row.id)
            .bind(row.provider_id)
            .bind(row.country_authority_method_id)
            .execute(self.conn()?)
            .await?;
        }
        Ok(())
    }

    async fn delete_transaction_configs(&mut self, provider_method_ids: &[Uuid]) -> Result<u64> {
        self.delete_by_ids(
            "DELETE FROM transaction_configs WHERE provider_method_id IN (",
            provider_method_ids,
        )
        .await
    }

    async fn delete_provider_methods(&mut self, provider_method_ids: &[Uuid]) -> Result<u64> {
        self.delete_by_ids(
            "DELETE FROM provider_methods WHERE id IN (",
            provider_method_ids,
        )
        .await
    }

    async fn delete_method_fields(&mut self, provider_method_ids: &[Uuid]) -> Result<u64> {
        self.delete_by_ids(
            "DELETE FROM provider_method_fields WHERE provider_method_id IN (",
            provider_method_ids,
        )
        .await
    }

    async fn delete_credentials_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64> {
        self.delete_scoped_not_bound("provider_credentials", provider_id, surviving)
            .await
    }

    async fn delete_bank_accounts_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64> {
        self.delete_scoped_not_bound("provider_bank_accounts", provider_id, surviving)
            .await
    }

    async fn delete_stp_rules_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64> {
        self.delete_scoped_not_bound("provider_stp_rules", provider_id, surviving)
            .await
    }

    async fn delete_restrictions_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64> {
        self.delete_scoped_not_bound("provider_restrictions", provider_id, surviving)
            .await
    }

    async fn delete_provider_fields_not_bound(
        &mut self,
        provider_id: Uuid,
        surviving: &[CountryAuthority],
    ) -> Result<u64> {
        self.delete_scoped_not_bound("provider_fields", provider_id, surviving)
            .await
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }
}
