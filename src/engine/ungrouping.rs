//! Ungrouping engine: expand rule groups back into concrete scope rows
//!
//! The inverse of grouping: each group expands to the cartesian product of
//! its country-authorities and currencies. A group with no currencies emits
//! one null-currency row per country-authority. O(groups × CAs × currencies).

use crate::domain::{RuleGroup, Scope, ScopedRecord};

/// Expand rule groups into the full set of concrete persisted rows.
pub fn ungroup_records<P: Clone>(groups: Vec<RuleGroup<P>>) -> Vec<ScopedRecord<P>> {
    let mut records = Vec::new();
    for group in groups {
        for ca in &group.parameters.country_authorities {
            if group.parameters.currencies.is_empty() {
                records.push(ScopedRecord::new(
                    Scope::new(Some(&ca.authority), ca.country.as_deref(), None),
                    group.payload.clone(),
                ));
            } else {
                for currency in &group.parameters.currencies {
                    records.push(ScopedRecord::new(
                        Scope::new(Some(&ca.authority), ca.country.as_deref(), Some(currency)),
                        group.payload.clone(),
                    ));
                }
            }
        }
    }
    records
}
