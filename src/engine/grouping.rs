//! Grouping engine: collapse scope rows into deduplicated rule groups
//!
//! Records sharing byte-identical payload content are bucketed together,
//! then split by currency qualification: country-authorities sharing the
//! same currency set form one group representing their cartesian product.
//! Output order is no-currency groups first, then currency groups in
//! discovery order; nothing stronger is guaranteed.

use super::hasher::{content_hash, ContentHash};
use crate::domain::{CaKey, CountryAuthority, RuleGroup, Scope, ScopedRecord};
use crate::error::{AppError, Result};
use serde::Serialize;
use std::collections::{hash_map::Entry, HashMap, HashSet};

struct PayloadBucket<P> {
    payload: P,
    scopes: Vec<Scope>,
}

/// Collapse N scope rows into a minimal set of rule groups.
///
/// Callers pass validated, provider-scoped rows; every scope must pin an
/// authority (fully wildcard rows such as common fields are handled by the
/// caller before grouping).
pub fn group_records<P>(records: Vec<ScopedRecord<P>>) -> Result<Vec<RuleGroup<P>>>
where
    P: Serialize + Clone,
{
    // Partition by payload content, preserving discovery order
    let mut buckets: Vec<PayloadBucket<P>> = Vec::new();
    let mut index: HashMap<ContentHash, usize> = HashMap::new();
    for record in records {
        let hash = content_hash(&record.payload)?;
        match index.get(&hash) {
            Some(&i) => buckets[i].scopes.push(record.scope),
            None => {
                index.insert(hash, buckets.len());
                buckets.push(PayloadBucket {
                    payload: record.payload,
                    scopes: vec![record.scope],
                });
            }
        }
    }

    let mut no_currency_groups = Vec::new();
    let mut currency_groups = Vec::new();

    for bucket in buckets {
        let (plain, with_currency) = split_bucket(&bucket.scopes)?;

        if !plain.is_empty() {
            no_currency_groups.push(RuleGroup::new(plain, Vec::new(), bucket.payload.clone()));
        }

        for (country_authorities, currencies) in group_by_currency_set(with_currency) {
            currency_groups.push(RuleGroup::new(
                country_authorities,
                currencies,
                bucket.payload.clone(),
            ));
        }
    }

    no_currency_groups.extend(currency_groups);
    Ok(no_currency_groups)
}

/// Split one payload bucket into distinct no-currency country-authorities and
/// per-country-authority currency lists. `{authority, country: null}` is kept
/// as-is, never expanded.
#[allow(clippy::type_complexity)]
fn split_bucket(
    scopes: &[Scope],
) -> Result<(Vec<CountryAuthority>, Vec<(CountryAuthority, Vec<String>)>)> {
    let mut plain: Vec<CountryAuthority> = Vec::new();
    let mut plain_seen: HashSet<CaKey> = HashSet::new();

    let mut order: Vec<CaKey> = Vec::new();
    let mut entries: HashMap<CaKey, (CountryAuthority, Vec<String>, HashSet<String>)> =
        HashMap::new();

    for scope in scopes {
        let ca = scope.country_authority().ok_or_else(|| {
            AppError::validation_id("Scope is missing an authority", scope.to_string())
        })?;
        match &scope.currency {
            None => {
                if plain_seen.insert(ca.key()) {
                    plain.push(ca);
                }
            }
            Some(currency) => {
                let key = ca.key();
                let entry = match entries.entry(key.clone()) {
                    Entry::Occupied(e) => e.into_mut(),
                    Entry::Vacant(e) => {
                        order.push(key);
                        e.insert((ca, Vec::new(), HashSet::new()))
                    }
                };
                if entry.2.insert(currency.clone()) {
                    entry.1.push(currency.clone());
                }
            }
        }
    }

    let with_currency = order
        .into_iter()
        .filter_map(|key| entries.remove(&key).map(|(ca, currencies, _)| (ca, currencies)))
        .collect();

    Ok((plain, with_currency))
}

/// Group country-authorities by identical currency set. The sorted currency
/// list is the structural grouping key; output currency lists are sorted.
fn group_by_currency_set(
    entries: Vec<(CountryAuthority, Vec<String>)>,
) -> Vec<(Vec<CountryAuthority>, Vec<String>)> {
    let mut order: Vec<Vec<String>> = Vec::new();
    let mut grouped: HashMap<Vec<String>, Vec<CountryAuthority>> = HashMap::new();

    for (ca, mut currencies) in entries {
        currencies.sort();
        if !grouped.contains_key(&currencies) {
            order.push(currencies.clone());
        }
        grouped.entry(currencies).or_default().push(ca);
    }

    order
        .into_iter()
        .filter_map(|set| grouped.remove(&set).map(|cas| (cas, set)))
        .collect()
}
