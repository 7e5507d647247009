//! Provider config upsert: reconcile the CAM/PM mapping in one transaction
//!
//! Given a provider and the full desired country-authority-method mapping,
//! the database reflects exactly that mapping afterwards. Missing CAM and
//! provider-method rows are created (disabled), provider methods no longer
//! in the desired set are detached with their downstream rows. Everything
//! runs in a single transaction; any failure rolls the whole upsert back.

use crate::cache::CacheManager;
use crate::config::LimitsConfig;
use crate::domain::{
    BoundMethod, CountryAuthority, CountryAuthorityMethod, NewCountryAuthorityMethod,
    NewProviderMethod, ProviderMethod, UpsertConfigInput, UpsertConfigResponse,
};
use crate::error::{AppError, Result};
use crate::repository::ConfigUnitOfWork;
use crate::service::config_cleanup::ConfigUpsertCleaner;
use crate::service::validation;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// CAM rows to create: desired (country-authority, method) pairs that have
/// no existing CAM.
pub fn diff_country_authority_methods(
    desired: &[(Uuid, Uuid)],
    existing: &[CountryAuthorityMethod],
) -> Vec<NewCountryAuthorityMethod> {
    let existing_pairs: HashSet<(Uuid, Uuid)> = existing
        .iter()
        .map(|cam| (cam.country_authority_id, cam.method_id))
        .collect();

    desired
        .iter()
        .filter(|pair| !existing_pairs.contains(pair))
        .map(|&(country_authority_id, method_id)| NewCountryAuthorityMethod {
            id: Uuid::new_v4(),
            method_id,
            country_authority_id,
        })
        .collect()
}

/// Provider methods to create (desired CAM without a PM) and to detach
/// (PM whose CAM left the desired set).
pub fn diff_provider_methods(
    provider_id: Uuid,
    desired_cam_ids: &HashSet<Uuid>,
    existing: &[ProviderMethod],
) -> (Vec<NewProviderMethod>, Vec<Uuid>) {
    let owned: HashSet<Uuid> = existing
        .iter()
        .map(|pm| pm.country_authority_method_id)
        .collect();

    let to_create = desired_cam_ids
        .iter()
        .filter(|cam_id| !owned.contains(cam_id))
        .map(|&country_authority_method_id| NewProviderMethod {
            id: Uuid::new_v4(),
            provider_id,
            country_authority_method_id,
        })
        .collect();

    let to_detach = existing
        .iter()
        .filter(|pm| !desired_cam_ids.contains(&pm.country_authority_method_id))
        .map(|pm| pm.id)
        .collect();

    (to_create, to_detach)
}

/// One normalized desired mapping entry with its resolved ids
struct DesiredEntry {
    country: String,
    authority: String,
    method_code: String,
    country_authority_id: Uuid,
    method_id: Uuid,
}

pub struct ConfigUpsertService<U: ConfigUnitOfWork> {
    uow: Arc<U>,
    limits: LimitsConfig,
    cache_manager: Option<CacheManager>,
}

impl<U: ConfigUnitOfWork> ConfigUpsertService<U> {
    pub fn new(uow: Arc<U>, limits: LimitsConfig, cache_manager: Option<CacheManager>) -> Self {
        Self {
            uow,
            limits,
            cache_manager,
        }
    }

    pub async fn upsert(&self, input: UpsertConfigInput) -> Result<UpsertConfigResponse> {
        input.validate()?;
        validation::ensure_limit(
            "country_authority_methods",
            self.limits.max_methods,
            input.country_authority_methods.len(),
        )?;

        // Normalize and reject duplicate mapping entries up front
        let mut seen = HashSet::new();
        let mut entries: Vec<(String, String, String)> = Vec::new();
        for entry in &input.country_authority_methods {
            let country = entry.country.trim().to_uppercase();
            let authority = entry.authority.trim().to_uppercase();
            let method = entry.method.trim().to_lowercase();
            if !seen.insert((country.clone(), authority.clone(), method.clone())) {
                return Err(AppError::conflict_id(
                    "Duplicate country-authority-method entry",
                    format!("{}:{}:{}", country, authority, method),
                ));
            }
            entries.push((country, authority, method));
        }

        let mut tx = self.uow.begin().await?;

        let provider = tx.upsert_provider(&input.provider).await?;

        // Resolve country-authority pairs and method codes to rows
        let pairs: Vec<(String, String)> = {
            let mut out = Vec::new();
            for (country, authority, _) in &entries {
                let pair = (country.clone(), authority.clone());
                if !out.contains(&pair) {
                    out.push(pair);
                }
            }
            out
        };
        let ca_rows = tx.find_country_authorities(&pairs).await?;
        let ca_by_pair: HashMap<(String, String), Uuid> = ca_rows
            .iter()
            .map(|row| {
                (
                    (row.country.to_uppercase(), row.authority.to_uppercase()),
                    row.id,
                )
            })
            .collect();

        let method_codes: Vec<String> = {
            let mut out = Vec::new();
            for (_, _, method) in &entries {
                if !out.contains(method) {
                    out.push(method.clone());
                }
            }
            out
        };
        let method_rows = tx.find_methods(&method_codes).await?;
        let method_by_code: HashMap<String, Uuid> = method_rows
            .iter()
            .map(|row| (row.code.to_lowercase(), row.id))
            .collect();

        let mut desired_entries = Vec::with_capacity(entries.len());
        for (country, authority, method_code) in entries {
            let country_authority_id = *ca_by_pair
                .get(&(country.clone(), authority.clone()))
                .ok_or_else(|| {
                    AppError::not_found_id(
                        "Unknown country-authority",
                        format!("{}:{}", country, authority),
                    )
                })?;
            let method_id = *method_by_code
                .get(&method_code)
                .ok_or_else(|| AppError::not_found_id("Unknown method", method_code.clone()))?;
            desired_entries.push(DesiredEntry {
                country,
                authority,
                method_code,
                country_authority_id,
                method_id,
            });
        }

        // Diff the CAM layer
        let desired_pairs: Vec<(Uuid, Uuid)> = {
            let mut out = Vec::new();
            for entry in &desired_entries {
                let pair = (entry.country_authority_id, entry.method_id);
                if !out.contains(&pair) {
                    out.push(pair);
                }
            }
            out
        };
        let ca_ids: Vec<Uuid> = {
            let mut out = Vec::new();
            for &(ca_id, _) in &desired_pairs {
                if !out.contains(&ca_id) {
                    out.push(ca_id);
                }
            }
            out
        };
        let method_ids: Vec<Uuid> = {
            let mut out = Vec::new();
            for &(_, method_id) in &desired_pairs {
                if !out.contains(&method_id) {
                    out.push(method_id);
                }
            }
            out
        };

        let existing_cams = tx
            .find_country_authority_methods(&ca_ids, &method_ids)
            .await?;
        let cams_to_create = diff_country_authority_methods(&desired_pairs, &existing_cams);
        tx.insert_country_authority_methods(&cams_to_create).await?;

        let mut cam_id_by_pair: HashMap<(Uuid, Uuid), Uuid> = existing_cams
            .iter()
            .map(|cam| ((cam.country_authority_id, cam.method_id), cam.id))
            .collect();
        for cam in &cams_to_create {
            cam_id_by_pair.insert((cam.country_authority_id, cam.method_id), cam.id);
        }

        // Diff the provider-method layer
        let desired_cam_ids: HashSet<Uuid> = desired_pairs
            .iter()
            .filter_map(|pair| cam_id_by_pair.get(pair).copied())
            .collect();
        let existing_pms = tx.find_provider_methods(provider.id).await?;
        let (pms_to_create, pms_to_detach) =
            diff_provider_methods(provider.id, &desired_cam_ids, &existing_pms);
        tx.insert_provider_methods(&pms_to_create).await?;

        if !pms_to_detach.is_empty() {
            let surviving: Vec<CountryAuthority> = {
                let mut out: Vec<CountryAuthority> = Vec::new();
                for entry in &desired_entries {
                    let ca = CountryAuthority::new(&entry.authority, Some(&entry.country));
                    if !out.contains(&ca) {
                        out.push(ca);
                    }
                }
                out
            };
            ConfigUpsertCleaner::clean(tx.as_mut(), provider.id, &pms_to_detach, &surviving)
                .await?;
        }

        tx.commit().await?;

        info!(
            provider = %provider.code,
            created_cams = cams_to_create.len(),
            created_methods = pms_to_create.len(),
            detached_methods = pms_to_detach.len(),
            "Provider config upserted"
        );

        if let Some(cache) = &self.cache_manager {
            let _ = cache.invalidate_provider(&provider.code).await;
        }

        // Response mapping: existing bindings keep their enabled state, new
        // ones start disabled
        let enabled_by_cam: HashMap<Uuid, bool> = existing_pms
            .iter()
            .map(|pm| (pm.country_authority_method_id, pm.is_enabled))
            .collect();
        let country_authority_methods = desired_entries
            .into_iter()
            .map(|entry| {
                let cam_id = cam_id_by_pair
                    .get(&(entry.country_authority_id, entry.method_id))
                    .copied();
                BoundMethod {
                    country: entry.country,
                    authority: entry.authority,
                    method: entry.method_code,
                    is_enabled: cam_id
                        .and_then(|id| enabled_by_cam.get(&id).copied())
                        .unwrap_or(false),
                }
            })
            .collect();

        Ok(UpsertConfigResponse {
            provider,
            country_authority_methods,
        })
    }
}
