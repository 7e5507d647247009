//! Provider bank account business logic

use crate::cache::{CacheManager, Section};
use crate::config::LimitsConfig;
use crate::domain::{BankAccount, Provider, RuleGroup};
use crate::engine::{group_records, ungroup_records};
use crate::error::{AppError, Result};
use crate::repository::{
    BankAccountRepository, CountryAuthorityRepository, CurrencyRepository, ProviderRepository,
};
use crate::service::validation;
use std::sync::Arc;

pub type BankAccountGroups = Vec<RuleGroup<Vec<BankAccount>>>;

pub struct BankAccountsService<
    R: BankAccountRepository,
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
        R: BankAccountRepository,
        P: ProviderRepository,
        A: CountryAuthorityRepository,
        C: CurrencyRepository,
    > BankAccountsService<R, P, A, C>
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

    pub async fn get(&self, provider_code: &str) -> Result<BankAccountGroups> {
        let provider = self.provider(provider_code).await?;

        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(cached)) = cache
                .get_section::<BankAccountGroups>(&provider.code, Section::BankAccounts)
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
                .set_section(&provider.code, Section::BankAccounts, &groups)
                .await;
        }
        Ok(groups)
    }

    pub async fn update(
        &self,
        provider_code: &str,
        groups: BankAccountGroups,
    ) -> Result<BankAccountGroups> {
        let provider = self.provider(provider_code).await?;

        for group in &groups {
            for account in &group.payload {
                if account.name.trim().is_empty() {
                    return Err(AppError::validation("Bank account name must not be empty"));
                }
            }
        }
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
                .invalidate_section(&provider.code, Section::BankAccounts)
                .await;
        }

        group_records(records)
    }
}
