//! Scoped records and rule groups
//!
//! `ScopedRecord` is one row as persisted; `RuleGroup` is the deduplicated
//! API-facing shape representing the cartesian product of its
//! country-authorities and currencies, all sharing identical payload content.
//! Rule groups exist only transiently as request/response DTOs and are always
//! translated to and from scoped records at the boundary.

use super::scope::{CountryAuthority, Scope};
use serde::{Deserialize, Serialize};

/// One scope-qualified row as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedRecord<P> {
    pub scope: Scope,
    pub payload: P,
}

impl<P> ScopedRecord<P> {
    pub fn new(scope: Scope, payload: P) -> Self {
        Self { scope, payload }
    }
}

/// The scope set a rule group applies to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupParameters {
    pub country_authorities: Vec<CountryAuthority>,
    #[serde(default)]
    pub currencies: Vec<String>,
}

/// The deduplicated, scope-set-carrying representation used at the API
/// boundary. An empty currency list means the payload is not
/// currency-qualified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup<P> {
    pub parameters: GroupParameters,
    pub payload: P,
}

impl<P> RuleGroup<P> {
    pub fn new(
        country_authorities: Vec<CountryAuthority>,
        currencies: Vec<String>,
        payload: P,
    ) -> Self {
        Self {
            parameters: GroupParameters {
                country_authorities,
                currencies,
            },
            payload,
        }
    }

    /// All concrete scopes this group claims
    pub fn concrete_scopes(&self) -> Vec<Scope> {
        let mut scopes = Vec::new();
        for ca in &self.parameters.country_authorities {
            if self.parameters.currencies.is_empty() {
                scopes.push(Scope::new(
                    Some(&ca.authority),
                    ca.country.as_deref(),
                    None,
                ));
            } else {
                for currency in &self.parameters.currencies {
                    scopes.push(Scope::new(
                        Some(&ca.authority),
                        ca.country.as_deref(),
                        Some(currency),
                    ));
                }
            }
        }
        scopes
    }
}
