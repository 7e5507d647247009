//! Platform restriction business logic

use crate::cache::{CacheManager, Section};
use crate::domain::{PlatformRestriction, Provider, RuleGroup};
use crate::engine::{group_records, ungroup_records};
use crate::error::{AppError, Result};
use crate::repository::{CountryAuthorityRepository, ProviderRepository, RestrictionRepository};
use crate::service::validation;
use std::sync::Arc;

pub type RestrictionGroups = Vec<RuleGroup<Vec<PlatformRestriction>>>;

pub struct RestrictionsService<
    R: RestrictionRepository,
    P: ProviderRepository,
    A: CountryAuthorityRepository,
> {
    repo: Arc<R>,
    provider_repo: Arc<P>,
    country_authority_repo: Arc<A>,
    cache_manager: Option<CacheManager>,
}

impl<R: RestrictionRepository, P: ProviderRepository, A: CountryAuthorityRepository>
    RestrictionsService<R, P, A>
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

    pub async fn get(&self, provider_code: &str) -> Result<RestrictionGroups> {
        let provider = self.provider(provider_code).await?;

        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(cached)) = cache
                .get_section::<RestrictionGroups>(&provider.code, Section::Restrictions)
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
                .set_section(&provider.code, Section::Restrictions, &groups)
                .await;
        }
        Ok(groups)
    }

    pub async fn update(
        &self,
        provider_code: &str,
        groups: RestrictionGroups,
    ) -> Result<RestrictionGroups> {
        let provider = self.provider(provider_code).await?;

        for group in &groups {
            for restriction in &group.payload {
                if !restriction.has_valid_versions() {
                    return Err(AppError::validation_id(
                        "Invalid version in platform restriction",
                        restriction.platform.to_string(),
                    ));
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
                .invalidate_section(&provider.code, Section::Restrictions)
                .await;
        }

        group_records(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CountryAuthority, CountryAuthorityRow, Platform, VersionCondition, VersionOperator};
    use crate::repository::{
        MockCountryAuthorityRepository, MockProviderRepository, MockRestrictionRepository,
    };
    use uuid::Uuid;

    fn provider() -> Provider {
        Provider {
            code: "stripe".to_string(),
            name: "Stripe".to_string(),
            ..Default::default()
        }
    }

    fn restriction(version: &str) -> PlatformRestriction {
        PlatformRestriction {
            platform: Platform::Android,
            is_enabled: true,
            settings: vec![VersionCondition {
                operator: VersionOperator::Gte,
                version: version.to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_version() {
        let the_provider = provider();
        let mut provider_repo = MockProviderRepository::new();
        provider_repo
            .expect_find_by_code()
            .returning(move |_| Ok(Some(the_provider.clone())));

        let service = RestrictionsService::new(
            Arc::new(MockRestrictionRepository::new()),
            Arc::new(provider_repo),
            Arc::new(MockCountryAuthorityRepository::new()),
            None,
        );

        let groups = vec![RuleGroup::new(
            vec![CountryAuthority::new("GM", Some("CY"))],
            vec![],
            vec![restriction("not.a.version!")],
        )];
        let err = service.update("stripe", groups).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_update_stores_valid_restrictions() {
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

        let mut repo = MockRestrictionRepository::new();
        repo.expect_replace_for_provider()
            .withf(move |id, records| *id == provider_id && records.len() == 1)
            .returning(|_, _| Ok(()));

        let service = RestrictionsService::new(
            Arc::new(repo),
            Arc::new(provider_repo),
            Arc::new(ca_repo),
            None,
        );

        let groups = vec![RuleGroup::new(
            vec![CountryAuthority::new("GM", Some("CY"))],
            vec![],
            vec![restriction("2.14.0")],
        )];
        let result = service.update("stripe", groups).await.unwrap();
        assert_eq!(result.len(), 1);
    }
}
