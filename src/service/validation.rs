//! Cross-cutting validation for rule-group write requests
//!
//! All checks run before any row is touched. Offending keys are carried in
//! `meta.id` so an operator can locate the entry in a large request.

use crate::domain::{CountryAuthorityRow, RuleGroup};
use crate::error::{AppError, Result};
use std::collections::HashSet;

/// No two groups may claim the same concrete scope.
pub fn ensure_unique_scopes<P>(groups: &[RuleGroup<P>]) -> Result<()> {
    let mut seen = HashSet::new();
    for group in groups {
        for scope in group.concrete_scopes() {
            if !seen.insert(scope.key()) {
                return Err(AppError::conflict_id(
                    "Duplicate scope in request",
                    scope.to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Every country-authority in the request must still be bound to the
/// provider through at least one provider method. An authority-only entry
/// is bound if any bound pair carries that authority.
pub fn ensure_bound_country_authorities<P>(
    groups: &[RuleGroup<P>],
    bound: &[CountryAuthorityRow],
) -> Result<()> {
    for group in groups {
        for ca in &group.parameters.country_authorities {
            let is_bound = bound.iter().any(|row| {
                row.authority.eq_ignore_ascii_case(&ca.authority)
                    && ca
                        .country
                        .as_deref()
                        .map_or(true, |country| row.country.eq_ignore_ascii_case(country))
            });
            if !is_bound {
                return Err(AppError::conflict_id(
                    "Country-authority is not bound to the provider",
                    format!(
                        "{}:{}",
                        ca.country.as_deref().unwrap_or("*"),
                        ca.authority
                    ),
                ));
            }
        }
    }
    Ok(())
}

/// Distinct currencies across all groups, upper-cased, in discovery order
pub fn distinct_currencies<P>(groups: &[RuleGroup<P>]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for group in groups {
        for currency in &group.parameters.currencies {
            let code = currency.trim().to_uppercase();
            if !code.is_empty() && !out.contains(&code) {
                out.push(code);
            }
        }
    }
    out
}

/// Every requested currency must exist in the currencies table.
pub fn ensure_known_currencies(requested: &[String], known: &[String]) -> Result<()> {
    for code in requested {
        if !known.iter().any(|k| k.eq_ignore_ascii_case(code)) {
            return Err(AppError::not_found_id("Unknown currency", code.clone()));
        }
    }
    Ok(())
}

/// Sections that are never currency-qualified reject currency lists.
pub fn ensure_no_currencies<P>(groups: &[RuleGroup<P>]) -> Result<()> {
    for group in groups {
        if let Some(currency) = group.parameters.currencies.first() {
            return Err(AppError::validation_id(
                "Currencies are not supported for this section",
                currency.clone(),
            ));
        }
    }
    Ok(())
}

pub fn ensure_limit(subject: &str, allowed: usize, actual: usize) -> Result<()> {
    if actual > allowed {
        return Err(AppError::MaxAllowedExceeded {
            subject: subject.to_string(),
            allowed,
            actual,
        });
    }
    Ok(())
}
