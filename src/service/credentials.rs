//! Provider credentials business logic

use crate::cache::{CacheManager, Section};
use crate::config::LimitsConfig;
use crate::domain::{CredentialDetail, Provider, RuleGroup};
use crate::engine::{group_records, ungroup_records};
use crate::error::{AppError, Result};
use crate::repository::{CountryAuthorityRepository, CredentialRepository, CurrencyRepository, ProviderRepository};
use crate::service::validation;
use std::sync::Arc;

pub type CredentialGroups = Vec<RuleGroup<Vec<CredentialDetail>>>;

pub struct CredentialsService<
    R: CredentialRepository,
    P: ProviderRepository,
    A: CountryAuthorityRepository,
    C: CurrencyRepository,
> {
    repo: Arc<R>,
    provider_repo: Arc<P>,
    country_authority_repo: Arc<A>,
    currency_repo: Arc<C>,
    limits: LimitsConfig,
    cache_manager: Option<CacheManager>,
}

impl<
        R: CredentialRepository,
        P: ProviderRepository,
        A: CountryAuthorityRepository,
        C: CurrencyRepository,
    > CredentialsService<R, P, A, C>
{
    pub fn new(
        repo: Arc<R>,
        provider_repo: Arc<P>,
        country_authority_repo: Arc<A>,
        currency_repo: Arc<C>,
        limits: LimitsConfig,
        cache_manager: Option<CacheManager>,
    ) -> Self {
        Self {
            repo,
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

    pub async fn get(&self, provider_code: &str) -> Result<CredentialGroups> {
        let provider = self.provider(provider_code).await?;

        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(cached)) = cache
                .get_section::<CredentialGroups>(&provider.code, Section::Credentials)
                .await
            {
                return Ok(cached);
            }
        }

        let records = self
            .repo
            .find_by_provider(provider.id)
            .await?
            .into_iter()
            .map(|row| row.into_record())
            .collect();
        let groups = group_records(records)?;

        if let Some(cache) = &self.cache_manager {
            let _ = cache
                .set_section(&provider.code, Section::Credentials, &groups)
                .await;
        }
        Ok(groups)
    }

    pub async fn update(
        &self,
        provider_code: &str,
        groups: CredentialGroups,
    ) -> Result<CredentialGroups> {
        let provider = self.provider(provider_code).await?;

        validation::ensure_unique_scopes(&groups)?;

        let bound = self
            .country_authority_repo
            .find_bound_to_provider(provider.id)
            .await?;
        validation::ensure_bound_country_authorities(&groups, &bound)?;

        let currencies = validation::distinct_currencies(&groups);
        validation::ensure_limit("currencies", self.limits.max_currencies, currencies.len())?;
        let known = self.currency_repo.find_known_codes(&currencies).await?;
        validation::ensure_known_currencies(&currencies, &known)?;

        let records = ungroup_records(groups);
        self.repo.replace_for_provider(provider.id, &records).await?;

        if let Some(cache) = &self.cache_manager {
            let _ = cache
                .invalidate_section(&provider.code, Section::Credentials)
                .await;
        }

        group_records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountryAuthority, CountryAuthorityRow, Scope};
    use crate::repository::{
        MockCountryAuthorityRepository, MockCredentialRepository, MockCurrencyRepository,
        MockProviderRepository,
    };
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn service(
        repo: MockCredentialRepository,
        provider_repo: MockProviderRepository,
        ca_repo: MockCountryAuthorityRepository,
        currency_repo: MockCurrencyRepository,
    ) -> CredentialsService<
        MockCredentialRepository,
        MockProviderRepository,
        MockCountryAuthorityRepository,
        MockCurrencyRepository,
    > {
        CredentialsService::new(
            Arc::new(repo),
            Arc::new(provider_repo),
            Arc::new(ca_repo),
            Arc::new(currency_repo),
            LimitsConfig::default(),
            None,
        )
    }

    fn provider() -> Provider {
        Provider {
            code: "stripe".to_string(),
            name: "Stripe".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_groups_identical_payloads() {
        let the_provider = provider();
        let provider_id = the_provider.id;

        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .with(eq("stripe"))
            .returning(move |_| Ok(Some(the_provider.clone())));

        let details = vec![CredentialDetail::new("api_key", "secret")];
        let mut repo = MockCredentialRepository::new();
        let rows_details = details.clone();
        repo.expect_find_by_provider()
            .with(eq(provider_id))
            .returning(move |_| {
                Ok(vec![
                    crate::repository::CredentialRow {
                        id: Uuid::new_v4(),
                        provider_id,
                        authority: Some("GM".to_string()),
                        country: Some("CY".to_string()),
                        currency: None,
                        details: sqlx::types::Json(rows_details.clone()),
                    },
                    crate::repository::CredentialRow {
                        id: Uuid::new_v4(),
                        provider_id,
                        authority: Some("FSCM".to_string()),
                        country: Some("MT".to_string()),
                        currency: None,
                        details: sqlx::types::Json(rows_details.clone()),
                    },
                ])
            });

        let service = service(
            repo,
            provider_repo,
            MockCountryAuthorityRepository::new(),
            MockCurrencyRepository::new(),
        );

        let groups = service.get("stripe").await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].parameters.country_authorities.len(), 2);
        assert_eq!(groups[0].payload, details);
    }

    #[tokio::test]
    async fn test_update_rejects_unbound_country_authority() {
        let the_provider = provider();
        let provider_id = the_provider.id;

        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let mut ca_repo = MockCountryAuthorityRepository::new();
        ca_repo
            .expect_find_bound_to_provider()
            .with(eq(provider_id))
            .returning(|_| {
                Ok(vec![CountryAuthorityRow {
                    id: Uuid::new_v4(),
                    country: "CY".to_string(),
                    authority: "GM".to_string(),
                }])
            });

        let service = service(
            MockCredentialRepository::new(),
            provider_repo,
            ca_repo,
            MockCurrencyRepository::new(),
        );

        let groups = vec![RuleGroup::new(
            vec![CountryAuthority::new("FSCM", Some("MT"))],
            vec![],
            vec![CredentialDetail::new("api_key", "secret")],
        )];
        let err = service.update("stripe", groups).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_writes_expanded_records() {
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

        let mut repo = MockCredentialRepository::new();
        repo.expect_replace_for_provider()
            .withf(move |id, records| {
                *id == provider_id
                    && records.len() == 2
                    && records[0].scope == Scope::new(Some("GM"), Some("CY"), Some("EUR"))
                    && records[1].scope == Scope::new(Some("GM"), Some("CY"), Some("USD"))
            })
            .returning(|_, _| Ok(()));

        let service = service(repo, provider_repo, ca_repo, currency_repo);

        let groups = vec![RuleGroup::new(
            vec![CountryAuthority::new("GM", Some("CY"))],
            vec!["EUR".to_string(), "USD".to_string()],
            vec![CredentialDetail::new("api_key", "secret")],
        )];
        let result = service.update("stripe", groups).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].parameters.currencies, vec!["EUR", "USD"]);
    }
}
