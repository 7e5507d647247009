//! Dynamic form field business logic
//!
//! The API shape splits fields into `common` (a provider-wide list applying
//! everywhere) and `specific` (rule groups pinned to country-authorities and
//! currencies). A specific field overrides the common field with the same
//! key when the effective list for a scope is resolved.

use crate::cache::{CacheManager, Section};
use crate::config::LimitsConfig;
use crate::domain::{FieldDefinition, Provider, RuleGroup, Scope, ScopedRecord};
use crate::engine::{bounded_records, group_records, ungroup_records};
use crate::error::{AppError, Result};
use crate::repository::{
    CountryAuthorityRepository, CurrencyRepository, FieldRecord, FieldsReader, FieldsWriter,
    ProviderRepository,
};
use crate::service::validation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Fields endpoint request/response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsPayload {
    #[serde(default)]
    pub common: Vec<FieldDefinition>,
    #[serde(default)]
    pub specific: Vec<RuleGroup<Vec<FieldDefinition>>>,
}

/// Specific fields override common fields by key; remaining specific fields
/// are appended after the common list.
pub fn resolve_effective_fields(
    common: &[FieldDefinition],
    specific: &[FieldDefinition],
) -> Vec<FieldDefinition> {
    let mut effective = Vec::with_capacity(common.len() + specific.len());
    for field in common {
        let overriding = specific.iter().find(|s| s.key == field.key);
        effective.push(overriding.unwrap_or(field).clone());
    }
    for field in specific {
        if !common.iter().any(|c| c.key == field.key) {
            effective.push(field.clone());
        }
    }
    effective
}

/// Concatenate per-transaction-type field lists into one list per scope,
/// keeping scope discovery order.
fn merge_across_transaction_types(records: Vec<FieldRecord>) -> Vec<ScopedRecord<Vec<FieldDefinition>>> {
    let mut order: Vec<ScopedRecord<Vec<FieldDefinition>>> = Vec::new();
    let mut index: HashMap<crate::domain::ScopeKey, usize> = HashMap::new();
    for record in records {
        match index.get(&record.scope.key()) {
            Some(&at) => order[at].payload.extend(record.fields),
            None => {
                index.insert(record.scope.key(), order.len());
                order.push(ScopedRecord::new(record.scope, record.fields));
            }
        }
    }
    order
}

pub struct FieldsService<P: ProviderRepository, A: CountryAuthorityRepository, C: CurrencyRepository>
{
    reader: Arc<dyn FieldsReader>,
    writer: Arc<dyn FieldsWriter>,
    provider_repo: Arc<P>,
    country_authority_repo: Arc<A>,
    currency_repo: Arc<C>,
    limits: LimitsConfig,
    cache_manager: Option<CacheManager>,
}

impl<P: ProviderRepository, A: CountryAuthorityRepository, C: CurrencyRepository>
    FieldsService<P, A, C>
{
    pub fn new(
        reader: Arc<dyn FieldsReader>,
        writer: Arc<dyn FieldsWriter>,
        provider_repo: Arc<P>,
        country_authority_repo: Arc<A>,
        currency_repo: Arc<C>,
        limits: LimitsConfig,
        cache_manager: Option<CacheManager>,
    ) -> Self {
        Self {
            reader,
            writer,
            provider_repo,
            country_authority_repo,
            currency_repo,
            limits,
            cache_manager,
        }
    }

    async fn provider(&self, code: &str) -> Result<Provider> {
        self.provider_repo
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found_id("Provider not found", code))
    }

    pub async fn get(&self, provider_code: &str) -> Result<FieldsPayload> {
        let provider = self.provider(provider_code).await?;

        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(cached)) = cache
                .get_section::<FieldsPayload>(&provider.code, Section::Fields)
                .await
            {
                return Ok(cached);
            }
        }

        let records = self.reader.find_by_provider(provider.id).await?;
        let merged = merge_across_transaction_types(records);

        let mut common = Vec::new();
        let mut scoped = Vec::new();
        for record in merged {
            if record.scope.is_wildcard() {
                common.extend(record.payload);
            } else {
                scoped.push(record);
            }
        }

        let payload = FieldsPayload {
            common,
            specific: group_records(scoped)?,
        };

        if let Some(cache) = &self.cache_manager {
            let _ = cache
                .set_section(&provider.code, Section::Fields, &payload)
                .await;
        }
        Ok(payload)
    }

    /// Resolve the field list effective for one concrete request scope:
    /// common fields overridden by whatever scoped rows bind to it.
    pub async fn get_effective(
        &self,
        provider_code: &str,
        scope: &Scope,
    ) -> Result<Vec<FieldDefinition>> {
        let provider = self.provider(provider_code).await?;

        let records = self.reader.find_by_provider(provider.id).await?;
        let merged = merge_across_transaction_types(records);

        let mut common = Vec::new();
        let mut scoped = Vec::new();
        for record in merged {
            if record.scope.is_wildcard() {
                common.extend(record.payload);
            } else {
                scoped.push(record);
            }
        }

        let mut specific: Vec<FieldDefinition> = Vec::new();
        for record in bounded_records(&scoped, scope) {
            for field in &record.payload {
                if !specific.iter().any(|f| f.key == field.key) {
                    specific.push(field.clone());
                }
            }
        }

        Ok(resolve_effective_fields(&common, &specific))
    }

    pub async fn update(&self, provider_code: &str, payload: FieldsPayload) -> Result<FieldsPayload> {
        let provider = self.provider(provider_code).await?;

        validation::ensure_limit("fields", self.limits.max_fields, payload.common.len())?;
        for group in &payload.specific {
            validation::ensure_limit("fields", self.limits.max_fields, group.payload.len())?;
        }
        ensure_unique_field_keys(&payload.common)?;
        for group in &payload.specific {
            ensure_unique_field_keys(&group.payload)?;
        }
        validation::ensure_unique_scopes(&payload.specific)?;

        let bound = self
            .country_authority_repo
            .find_bound_to_provider(provider.id)
            .await?;
        validation::ensure_bound_country_authorities(&payload.specific, &bound)?;

        let currencies = validation::distinct_currencies(&payload.specific);
        validation::ensure_limit("currencies", self.limits.max_currencies, currencies.len())?;
        let known = self.currency_repo.find_known_codes(&currencies).await?;
        validation::ensure_known_currencies(&currencies, &known)?;

        let FieldsPayload { common, specific } = payload;
        let scoped = ungroup_records(specific);

        let mut records = Vec::new();
        if !common.is_empty() {
            records.push(FieldRecord {
                scope: Scope::wildcard(),
                transaction_type: None,
                fields: common.clone(),
            });
        }
        for record in &scoped {
            records.push(FieldRecord {
                scope: record.scope.clone(),
                transaction_type: None,
                fields: record.payload.clone(),
            });
        }

        self.writer.replace_for_provider(provider.id, &records).await?;

        if let Some(cache) = &self.cache_manager {
            let _ = cache
                .invalidate_section(&provider.code, Section::Fields)
                .await;
        }

        // Re-group the expanded rows so the response carries normalized
        // scopes rather than echoing the request
        Ok(FieldsPayload {
            common,
            specific: group_records(scoped)?,
        })
    }
}

fn ensure_unique_field_keys(fields: &[FieldDefinition]) -> Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.key == field.key) {
            return Err(AppError::conflict_id(
                "Duplicate field key",
                field.key.clone(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountryAuthority, CountryAuthorityRow, TransactionType};
    use crate::repository::{
        MockCountryAuthorityRepository, MockCurrencyRepository, MockFieldsReader,
        MockFieldsWriter, MockProviderRepository,
    };
    use uuid::Uuid;

    fn provider() -> Provider {
        Provider {
            code: "stripe".to_string(),
            name: "Stripe".to_string(),
            ..Default::default()
        }
    }

    fn field(key: &str) -> FieldDefinition {
        FieldDefinition::text(key)
    }

    fn service(
        reader: MockFieldsReader,
        writer: MockFieldsWriter,
        provider_repo: MockProviderRepository,
        ca_repo: MockCountryAuthorityRepository,
        currency_repo: MockCurrencyRepository,
    ) -> FieldsService<MockProviderRepository, MockCountryAuthorityRepository, MockCurrencyRepository>
    {
        FieldsService::new(
            Arc::new(reader),
            Arc::new(writer),
            Arc::new(provider_repo),
            Arc::new(ca_repo),
            Arc::new(currency_repo),
            LimitsConfig::default(),
            None,
        )
    }

    #[test]
    fn test_resolve_effective_fields_overrides_by_key() {
        let common = vec![field("iban"), field("holder")];
        let mut specific_iban = field("iban");
        specific_iban.is_mandatory = true;
        let specific = vec![specific_iban, field("swift")];

        let effective = resolve_effective_fields(&common, &specific);
        assert_eq!(
            effective.iter().map(|f| f.key.as_str()).collect::<Vec<_>>(),
            vec!["iban", "holder", "swift"]
        );
        assert!(effective[0].is_mandatory);
    }

    #[tokio::test]
    async fn test_get_merges_transaction_types_and_splits_common() {
        let the_provider = provider();
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let mut reader = MockFieldsReader::new();
        reader.expect_find_by_provider().returning(move |_| {
            Ok(vec![
                FieldRecord {
                    scope: Scope::wildcard(),
                    transaction_type: None,
                    fields: vec![field("holder")],
                },
                FieldRecord {
                    scope: Scope::new(Some("GM"), Some("CY"), None),
                    transaction_type: Some(TransactionType::Deposit),
                    fields: vec![field("iban")],
                },
                FieldRecord {
                    scope: Scope::new(Some("GM"), Some("CY"), None),
                    transaction_type: Some(TransactionType::Payout),
                    fields: vec![field("swift")],
                },
            ])
        });

        let service = service(
            reader,
            MockFieldsWriter::new(),
            provider_repo,
            MockCountryAuthorityRepository::new(),
            MockCurrencyRepository::new(),
        );

        let payload = service.get("stripe").await.unwrap();
        assert_eq!(payload.common.len(), 1);
        assert_eq!(payload.specific.len(), 1);
        // deposit and payout lists of the same scope become one field list
        assert_eq!(
            payload.specific[0]
                .payload
                .iter()
                .map(|f| f.key.as_str())
                .collect::<Vec<_>>(),
            vec!["iban", "swift"]
        );
    }

    #[tokio::test]
    async fn test_update_rejects_duplicate_field_keys() {
        let the_provider = provider();
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let service = service(
            MockFieldsReader::new(),
            MockFieldsWriter::new(),
            provider_repo,
            MockCountryAuthorityRepository::new(),
            MockCurrencyRepository::new(),
        );

        let payload = FieldsPayload {
            common: vec![field("iban"), field("iban")],
            specific: vec![],
        };
        let err = service.update("stripe", payload).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_writes_common_and_specific_records() {
        let the_provider = provider();
        let provider_id = the_provider.id;
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let mut ca_repo = MockCountryAuthorityRepository::new();
        ca_repo.expect_find_bound_to_provider().returning(|_| {
            Ok(vec![CountryAuthorityRow {
                id: Uuid::new_v4(),
                country: "CY".to_string(),
                authority: "GM".to_string(),
            }])
        });

        let mut currency_repo = MockCurrencyRepository::new();
        currency_repo
            .expect_find_known_codes()
            .returning(|codes| Ok(codes.to_vec()));

        let mut writer = MockFieldsWriter::new();
        writer
            .expect_replace_for_provider()
            .withf(move |id, records| {
                *id == provider_id
                    && records.len() == 2
                    && records[0].scope.is_wildcard()
                    && records[1].scope == Scope::new(Some("GM"), Some("CY"), Some("EUR"))
            })
            .returning(|_, _| Ok(()));

        let service = service(
            MockFieldsReader::new(),
            writer,
            provider_repo,
            ca_repo,
            currency_repo,
        );

        let payload = FieldsPayload {
            common: vec![field("holder")],
            specific: vec![RuleGroup::new(
                vec![CountryAuthority::new("GM", Some("CY"))],
                vec!["EUR".to_string()],
                vec![field("iban")],
            )],
        };
        let result = service.update("stripe", payload.clone()).await.unwrap();
        assert_eq!(result, payload);
    }

    #[tokio::test]
    async fn test_update_returns_normalized_scopes() {
        let the_provider = provider();
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let mut ca_repo = MockCountryAuthorityRepository::new();
        ca_repo.expect_find_bound_to_provider().returning(|_| {
            Ok(vec![CountryAuthorityRow {
                id: Uuid::new_v4(),
                country: "CY".to_string(),
                authority: "GM".to_string(),
            }])
        });

        let mut currency_repo = MockCurrencyRepository::new();
        currency_repo
            .expect_find_known_codes()
            .returning(|codes| Ok(codes.to_vec()));

        let mut writer = MockFieldsWriter::new();
        writer
            .expect_replace_for_provider()
            .returning(|_, _| Ok(()));

        let service = service(
            MockFieldsReader::new(),
            writer,
            provider_repo,
            ca_repo,
            currency_repo,
        );

        // A deserialized request can carry lowercase dimension values
        let payload = FieldsPayload {
            common: vec![],
            specific: vec![RuleGroup::new(
                vec![CountryAuthority {
                    authority: "gm".to_string(),
                    country: Some("cy".to_string()),
                }],
                vec!["eur".to_string()],
                vec![field("iban")],
            )],
        };
        let result = service.update("stripe", payload).await.unwrap();
        let parameters = &result.specific[0].parameters;
        assert_eq!(parameters.country_authorities[0].authority, "GM");
        assert_eq!(parameters.country_authorities[0].country.as_deref(), Some("CY"));
        assert_eq!(parameters.currencies, vec!["EUR"]);
    }

    #[tokio::test]
    async fn test_get_effective_overrides_common_for_bound_scope() {
        let the_provider = provider();
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let mut reader = MockFieldsReader::new();
        reader.expect_find_by_provider().returning(move |_| {
            let mut mandatory_holder = field("holder");
            mandatory_holder.is_mandatory = true;
            Ok(vec![
                FieldRecord {
                    scope: Scope::wildcard(),
                    transaction_type: None,
                    fields: vec![field("holder")],
                },
                FieldRecord {
                    scope: Scope::new(Some("GM"), Some("CY"), None),
                    transaction_type: None,
                    fields: vec![mandatory_holder, field("iban")],
                },
                FieldRecord {
                    scope: Scope::new(Some("FSCM"), Some("MT"), None),
                    transaction_type: None,
                    fields: vec![field("swift")],
                },
            ])
        });

        let service = service(
            reader,
            MockFieldsWriter::new(),
            provider_repo,
            MockCountryAuthorityRepository::new(),
            MockCurrencyRepository::new(),
        );

        let effective = service
            .get_effective("stripe", &Scope::new(Some("GM"), Some("CY"), None))
            .await
            .unwrap();
        assert_eq!(
            effective.iter().map(|f| f.key.as_str()).collect::<Vec<_>>(),
            vec!["holder", "iban"]
        );
        // The CY:GM row overrides the common holder definition
        assert!(effective[0].is_mandatory);
    }
}
