//! Straight-through-processing rule business logic

use crate::cache::{CacheManager, Section};
use crate::domain::{Provider, RuleGroup, StpRule};
use crate::engine::{group_records, ungroup_records};
use crate::error::{AppError, Result};
use crate::repository::{CountryAuthorityRepository, ProviderRepository, StpRuleRepository};
use crate::service::validation;
use std::sync::Arc;

pub type StpRuleGroups = Vec<RuleGroup<Vec<StpRule>>>;

pub struct StpRulesService<
    R: StpRuleRepository,
    P: ProviderRepository,
    A: CountryAuthorityRepository,
> {
    repo: Arc<R>,
    provider_repo: Arc<P>,
    country_authority_repo: Arc<A>,
    cache_manager: Option<CacheManager>,
}

impl<R: StpRuleRepository, P: ProviderRepository, A: CountryAuthorityRepository>
    StpRulesService<R, P, A>
{
    pub fn new(
        repo: Arc<R>,
        provider_repo: Arc<P>,
        country_authority_repo: Arc<A>,
        cache_manager: Option<CacheManager>,
    ) -> Self {
        Self {
            repo,
            provider_repo,
            country_authority_repo,
            cache_manager,
        }
    }

    async fn provider(&self, code: &str) -> Result<Provider> {
        self.provider_repo
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found_id("Provider not found", code))
    }

    pub async fn get(&self, provider_code: &str) -> Result<StpRuleGroups> {
        let provider = self.provider(provider_code).await?;

        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(cached)) = cache
                .get_section::<StpRuleGroups>(&provider.code, Section::StpRules)
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
                .set_section(&provider.code, Section::StpRules, &groups)
                .await;
        }
        Ok(groups)
    }

    pub async fn update(&self, provider_code: &str, groups: StpRuleGroups) -> Result<StpRuleGroups> {
        let provider = self.provider(provider_code).await?;

        for group in &groups {
            for rule in &group.payload {
                if !rule.is_known_key() {
                    return Err(AppError::validation_id("Unknown STP rule", rule.key.clone()));
                }
            }
        }
        validation::ensure_no_currencies(&groups)?;
        validation::ensure_unique_scopes(&groups)?;

        let bound = self
            .country_authority_repo
            .find_bound_to_provider(provider.id)
            .await?;
        validation::ensure_bound_country_authorities(&groups, &bound)?;

        let records = ungroup_records(groups);
        self.repo.replace_for_provider(provider.id, &records).await?;

        if let Some(cache) = &self.cache_manager {
            let _ = cache
                .invalidate_section(&provider.code, Section::StpRules)
                .await;
        }

        group_records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountryAuthority, CountryAuthorityRow};
    use crate::repository::{
        MockCountryAuthorityRepository, MockProviderRepository, MockStpRuleRepository,
    };
    use uuid::Uuid;

    fn provider() -> Provider {
        Provider {
            code: "stripe".to_string(),
            name: "Stripe".to_string(),
            ..Default::default()
        }
    }

    fn rule(key: &str) -> StpRule {
        StpRule {
            key: key.to_string(),
            is_enabled: true,
            value: Some(serde_json::json!(1000)),
        }
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_rule_key() {
        let the_provider = provider();
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let service = StpRulesService::new(
            Arc::new(MockStpRuleRepository::new()),
            Arc::new(provider_repo),
            Arc::new(MockCountryAuthorityRepository::new()),
            None,
        );

        let groups = vec![RuleGroup::new(
            vec![CountryAuthority::new("GM", Some("CY"))],
            vec![],
            vec![rule("moon_phase")],
        )];
        let err = service.update("stripe", groups).await.unwrap_err();
        match err {
            AppError::Validation { id, .. } => assert_eq!(id.as_deref(), Some("moon_phase")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_rejects_currency_scoped_group() {
        let the_provider = provider();
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let service = StpRulesService::new(
            Arc::new(MockStpRuleRepository::new()),
            Arc::new(provider_repo),
            Arc::new(MockCountryAuthorityRepository::new()),
            None,
        );

        let groups = vec![RuleGroup::new(
            vec![CountryAuthority::new("GM", Some("CY"))],
            vec!["EUR".to_string()],
            vec![rule("deposits_amount")],
        )];
        assert!(service.update("stripe", groups).await.is_err());
    }

    #[tokio::test]
    async fn test_update_accepts_known_rules_for_bound_scope() {
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

        let mut repo = MockStpRuleRepository::new();
        repo.expect_replace_for_provider()
            .withf(move |id, records| *id == provider_id && records.len() == 1)
            .returning(|_, _| Ok(()));

        let service = StpRulesService::new(
            Arc::new(repo),
            Arc::new(provider_repo),
            Arc::new(ca_repo),
            None,
        );

        let groups = vec![RuleGroup::new(
            vec![CountryAuthority::new("GM", Some("CY"))],
            vec![],
            vec![rule("deposits_amount"), rule("kyc_status")],
        )];
        let result = service.update("stripe", groups).await.unwrap();
        assert_eq!(result.len(), 1);
    }
}
