//! Per-currency transaction settings for one provider method

use crate::cache::CacheManager;
use crate::config::LimitsConfig;
use crate::domain::{
    CurrencySetting, Provider, TransactionConfig, TransactionSetting, TransactionType,
};
use crate::error::{AppError, Result};
use crate::repository::{
    CurrencyRepository, ProviderMethodRepository, ProviderRepository, TransactionConfigRepository,
};
use crate::service::validation;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Build one transaction config row from a settings payload. Amounts are
/// normalized to 4 decimal places and `min_amount <= max_amount` is
/// enforced. Updates keep the existing row id so the write is an upsert.
pub fn build_transaction_config(
    provider_method_id: Uuid,
    currency: &str,
    transaction_type: TransactionType,
    setting: &TransactionSetting,
    existing: Option<&TransactionConfig>,
) -> Result<TransactionConfig> {
    let min_amount = setting.min_amount.map(|amount| amount.round_dp(4));
    let max_amount = setting.max_amount.map(|amount| amount.round_dp(4));

    if let (Some(min), Some(max)) = (min_amount, max_amount) {
        if min > max {
            return Err(AppError::validation_id(
                "min_amount must not exceed max_amount",
                format!("{}:{}", currency.to_uppercase(), transaction_type),
            ));
        }
    }

    Ok(TransactionConfig {
        id: existing.map(|config| config.id).unwrap_or_else(Uuid::new_v4),
        provider_method_id,
        currency: currency.to_uppercase(),
        transaction_type,
        min_amount,
        max_amount,
        is_enabled: setting.is_enabled,
        updated_at: Utc::now(),
    })
}

/// Fold persisted rows back into per-currency settings, in row order
pub fn group_by_currency(configs: Vec<TransactionConfig>) -> Vec<CurrencySetting> {
    let mut order: Vec<CurrencySetting> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for config in configs {
        let at = match index.get(&config.currency) {
            Some(&at) => at,
            None => {
                index.insert(config.currency.clone(), order.len());
                order.push(CurrencySetting {
                    currency: config.currency.clone(),
                    deposit: None,
                    payout: None,
                    refund: None,
                });
                order.len() - 1
            }
        };

        let setting = TransactionSetting {
            min_amount: config.min_amount,
            max_amount: config.max_amount,
            is_enabled: config.is_enabled,
        };
        match config.transaction_type {
            TransactionType::Deposit => order[at].deposit = Some(setting),
            TransactionType::Payout => order[at].payout = Some(setting),
            TransactionType::Refund => order[at].refund = Some(setting),
        }
    }
    order
}

pub struct MethodConfigsService<
    P: ProviderRepository,
    M: ProviderMethodRepository,
    T: TransactionConfigRepository,
    C: CurrencyRepository,
> {
    provider_repo: Arc<P>,
    provider_method_repo: Arc<M>,
    config_repo: Arc<T>,
    currency_repo: Arc<C>,
    limits: LimitsConfig,
    cache_manager: Option<CacheManager>,
}

impl<
        P: ProviderRepository,
        M: ProviderMethodRepository,
        T: TransactionConfigRepository,
        C: CurrencyRepository,
    > MethodConfigsService<P, M, T, C>
{
    pub fn new(
        provider_repo: Arc<P>,
        provider_method_repo: Arc<M>,
        config_repo: Arc<T>,
        currency_repo: Arc<C>,
        limits: LimitsConfig,
        cache_manager: Option<CacheManager>,
    ) -> Self {
        Self {
            provider_repo,
            provider_method_repo,
            config_repo,
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

    async fn provider_method_id(
        &self,
        provider: &Provider,
        country: &str,
        authority: &str,
        method_code: &str,
    ) -> Result<Uuid> {
        let country = country.trim().to_uppercase();
        let authority = authority.trim().to_uppercase();
        let binding = self
            .provider_method_repo
            .find_binding(provider.id, &country, &authority, method_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found_id(
                    "Method is not bound to the provider for this country-authority",
                    format!("{}:{}:{}", country, authority, method_code),
                )
            })?;
        Ok(binding.id)
    }

    pub async fn get_configs(
        &self,
        provider_code: &str,
        country: &str,
        authority: &str,
        method_code: &str,
    ) -> Result<Vec<CurrencySetting>> {
        let provider = self.provider(provider_code).await?;
        let provider_method_id = self
            .provider_method_id(&provider, country, authority, method_code)
            .await?;

        let configs = self
            .config_repo
            .find_by_provider_method(provider_method_id)
            .await?;
        Ok(group_by_currency(configs))
    }

    pub async fn update_configs(
        &self,
        provider_code: &str,
        country: &str,
        authority: &str,
        method_code: &str,
        settings: Vec<CurrencySetting>,
    ) -> Result<Vec<CurrencySetting>> {
        let provider = self.provider(provider_code).await?;
        let provider_method_id = self
            .provider_method_id(&provider, country, authority, method_code)
            .await?;

        validation::ensure_limit("currencies", self.limits.max_currencies, settings.len())?;

        let mut currencies = Vec::with_capacity(settings.len());
        let mut seen = HashSet::new();
        for setting in &settings {
            let code = setting.currency.trim().to_uppercase();
            if !seen.insert(code.clone()) {
                return Err(AppError::conflict_id("Duplicate currency", code));
            }
            currencies.push(code);
        }
        let known = self.currency_repo.find_known_codes(&currencies).await?;
        validation::ensure_known_currencies(&currencies, &known)?;

        let existing = self
            .config_repo
            .find_by_provider_method(provider_method_id)
            .await?;
        let existing_by_key: HashMap<(String, TransactionType), &TransactionConfig> = existing
            .iter()
            .map(|config| ((config.currency.clone(), config.transaction_type), config))
            .collect();

        let mut rows = Vec::new();
        for setting in &settings {
            let currency = setting.currency.trim().to_uppercase();
            let per_type = [
                (TransactionType::Deposit, setting.deposit.as_ref()),
                (TransactionType::Payout, setting.payout.as_ref()),
                (TransactionType::Refund, setting.refund.as_ref()),
            ];
            for (transaction_type, maybe_setting) in per_type {
                if let Some(tx_setting) = maybe_setting {
                    rows.push(build_transaction_config(
                        provider_method_id,
                        &currency,
                        transaction_type,
                        tx_setting,
                        existing_by_key
                            .get(&(currency.clone(), transaction_type))
                            .copied(),
                    )?);
                }
            }
        }

        self.config_repo.upsert_many(&rows).await?;

        if let Some(cache) = &self.cache_manager {
            let _ = cache.invalidate_provider(&provider.code).await;
        }

        let refreshed = self
            .config_repo
            .find_by_provider_method(provider_method_id)
            .await?;
        Ok(group_by_currency(refreshed))
    }
}
