//! Dynamic form field persistence
//!
//! Two storage layouts exist side by side. The scoped layout keeps one row
//! per scope with the whole field list as a JSON blob. The legacy layout
//! keeps one row per field, tied to the owning provider method where the
//! scope pins a country-authority. Which layout serves the fields endpoints
//! is decided once at startup from `FieldsSchema`; callers only ever see the
//! `FieldsReader`/`FieldsWriter` traits.

use crate::domain::{FieldDefinition, FieldOption, FieldType, Scope, TransactionType};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use std::collections::HashMap;
use uuid::Uuid;

/// One persisted field list: a scope, an optional transaction type it is
/// limited to, and the field definitions themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub scope: Scope,
    pub transaction_type: Option<TransactionType>,
    pub fields: Vec<FieldDefinition>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldsReader: Send + Sync {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<FieldRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldsWriter: Send + Sync {
    /// Atomically replace all field rows of a provider
    async fn replace_for_provider(&self, provider_id: Uuid, records: &[FieldRecord])
        -> Result<()>;
}

/// Scoped layout: one `provider_fields` row per scope, fields as JSON
#[derive(Debug, Clone, FromRow)]
struct ScopedFieldsRow {
    pub authority: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub fields: Json<Vec<FieldDefinition>>,
}

pub struct ScopedFieldsRepository {
    pool: MySqlPool,
}

impl ScopedFieldsRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FieldsReader for ScopedFieldsRepository {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<FieldRecord>> {
        let rows = sqlx::query_as::<_, ScopedFieldsRow>(
            r#"
            SELECT authority, country, currency, transaction_type, fields
            FROM provider_fields
            WHERE provider_id = ?
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| FieldRecord {
                scope: Scope::new(
                    row.authority.as_deref(),
                    row.country.as_deref(),
                    row.currency.as_deref(),
                ),
                transaction_type: row.transaction_type,
                fields: row.fields.0,
            })
            .collect())
    }
}

#[async_trait]
impl FieldsWriter for ScopedFieldsRepository {
    async fn replace_for_provider(
        &self,
        provider_id: Uuid,
        records: &[FieldRecord],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM provider_fields WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO provider_fields
                    (id, provider_id, authority, country, currency, transaction_type, fields)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(provider_id)
            .bind(&record.scope.authority)
            .bind(&record.scope.country)
            .bind(&record.scope.currency)
            .bind(record.transaction_type)
            .bind(Json(&record.fields))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Legacy layout: one `provider_method_fields` row per field definition.
/// Rows with a null `provider_method_id` are provider-wide (wildcard scope)
/// rows; pinned scopes carry the id of each bound provider method so a
/// method detach can cascade onto its field rows.
#[derive(Debug, Clone, FromRow)]
struct LegacyFieldRow {
    pub authority: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub field_key: String,
    pub field_type: String,
    pub name: Option<String>,
    pub default_value: Option<String>,
    pub pattern: Option<String>,
    pub is_mandatory: bool,
    pub is_enabled: bool,
    pub options: Json<Vec<FieldOption>>,
}

#[derive(Debug, Clone, FromRow)]
struct BoundMethodRow {
    pub id: Uuid,
    pub authority: String,
    pub country: Option<String>,
}

pub struct LegacyFieldsRepository {
    pool: MySqlPool,
}

impl LegacyFieldsRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Provider method ids keyed by the country-authority they bind
    async fn bound_method_ids(&self, provider_id: Uuid) -> Result<HashMap<crate::domain::CaKey, Vec<Uuid>>> {
        let rows = sqlx::query_as::<_, BoundMethodRow>(
            r#"
            SELECT pm.id, ca.authority, ca.country
            FROM provider_methods pm
            INNER JOIN country_authority_methods cam ON cam.id = pm.country_authority_method_id
            INNER JOIN country_authorities ca ON ca.id = cam.country_authority_id
            WHERE pm.provider_id = ?
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_ca: HashMap<crate::domain::CaKey, Vec<Uuid>> = HashMap::new();
        for row in rows {
            let key = crate::domain::CountryAuthority::new(row.authority, row.country.as_deref()).key();
            by_ca.entry(key).or_default().push(row.id);
        }
        Ok(by_ca)
    }
}

#[async_trait]
impl FieldsReader for LegacyFieldsRepository {
    async fn find_by_provider(&self, provider_id: Uuid) -> Result<Vec<FieldRecord>> {
        let rows = sqlx::query_as::<_, LegacyFieldRow>(
            r#"
            SELECT authority, country, currency, transaction_type,
                   field_key, field_type, name, default_value, pattern,
                   is_mandatory, is_enabled, options
            FROM provider_method_fields
            WHERE provider_id = ?
            ORDER BY position
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        // Rebuild one record per (scope, transaction type) in row order
        let mut order = Vec::new();
        let mut index: HashMap<(crate::domain::ScopeKey, Option<TransactionType>), usize> =
            HashMap::new();
        for row in rows {
            let scope = Scope::new(
                row.authority.as_deref(),
                row.country.as_deref(),
                row.currency.as_deref(),
            );
            let field_type: FieldType = row
                .field_type
                .parse()
                .map_err(|e: String| AppError::validation(e))?;
            let field = FieldDefinition {
                key: row.field_key,
                field_type,
                name: row.name,
                default_value: row.default_value,
                pattern: row.pattern,
                is_mandatory: row.is_mandatory,
                is_enabled: row.is_enabled,
                options: row.options.0,
            };

            let key = (scope.key(), row.transaction_type);
            match index.get(&key) {
                Some(&at) => {
                    // Pinned scopes store one row set per bound provider
                    // method, so the same field comes back once per method
                    let record: &mut FieldRecord = &mut order[at];
                    if !record.fields.iter().any(|f| f.key == field.key) {
                        record.fields.push(field);
                    }
                }
                None => {
                    index.insert(key, order.len());
                    order.push(FieldRecord {
                        scope,
                        transaction_type: row.transaction_type,
                        fields: vec![field],
                    });
                }
            }
        }

        Ok(order)
    }
}

#[async_trait]
impl FieldsWriter for LegacyFieldsRepository {
    async fn replace_for_provider(
        &self,
        provider_id: Uuid,
        records: &[FieldRecord],
    ) -> Result<()> {
        let by_ca = self.bound_method_ids(provider_id).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM provider_method_fields WHERE provider_id = ?")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        let mut position = 0i32;
        for record in records {
            // A pinned scope writes one row set per bound provider method so
            // a later method detach can delete exactly its rows. A wildcard
            // scope writes a single provider-wide row set.
            let method_ids: Vec<Option<Uuid>> = match record
                .scope
                .country_authority()
                .map(|ca| ca.key())
                .and_then(|key| by_ca.get(&key))
            {
                Some(ids) => ids.iter().copied().map(Some).collect(),
                None => vec![None],
            };

            for method_id in method_ids {
                for field in &record.fields {
                    sqlx::query(
                        r#"
                        INSERT INTO provider_method_fields
                            (id, provider_id, provider_method_id,
                             authority, country, currency, transaction_type,
                             field_key, field_type, name, default_value, pattern,
                             is_mandatory, is_enabled, options, position)
                        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(provider_id)
                    .bind(method_id)
                    .bind(&record.scope.authority)
                    .bind(&record.scope.country)
                    .bind(&record.scope.currency)
                    .bind(record.transaction_type)
                    .bind(&field.key)
                    .bind(field.field_type.to_string())
                    .bind(&field.name)
                    .bind(&field.default_value)
                    .bind(&field.pattern)
                    .bind(field.is_mandatory)
                    .bind(field.is_enabled)
                    .bind(Json(&field.options))
                    .bind(position)
                    .execute(&mut *tx)
                    .await?;
                    position += 1;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
