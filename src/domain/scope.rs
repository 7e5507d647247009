//! Scope types qualifying configuration rows
//!
//! A scope pins zero or more of the authority/country/currency dimensions;
//! an absent dimension is a wildcard ("applies to all values, overridden by
//! more specific rows"). Rows are always loaded per provider, so the provider
//! dimension is implicit here. Values are upper-cased at the boundary and
//! compared case-insensitively.

use serde::{Deserialize, Serialize};

/// Normalize a dimension value: trim, upper-case, empty becomes a wildcard.
pub fn normalize_dimension(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_uppercase)
}

/// A country-authority pair as it appears in rule-group parameters.
///
/// `country: None` means "all countries under this authority" and is
/// preserved as-is, never expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryAuthority {
    pub authority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl CountryAuthority {
    pub fn new(authority: impl Into<String>, country: Option<&str>) -> Self {
        Self {
            authority: authority.into().trim().to_uppercase(),
            country: normalize_dimension(country),
        }
    }

    /// Structural key with normalized casing
    pub fn key(&self) -> CaKey {
        CaKey {
            authority: self.authority.to_uppercase(),
            country: normalize_dimension(self.country.as_deref()),
        }
    }
}

/// Structural map key for a country-authority pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaKey {
    pub authority: String,
    pub country: Option<String>,
}

/// A scope qualifying one persisted configuration row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Scope {
    pub fn new(authority: Option<&str>, country: Option<&str>, currency: Option<&str>) -> Self {
        Self {
            authority: normalize_dimension(authority),
            country: normalize_dimension(country),
            currency: normalize_dimension(currency),
        }
    }

    /// Fully wildcard scope (applies to every request scope)
    pub fn wildcard() -> Self {
        Self::default()
    }

    pub fn is_wildcard(&self) -> bool {
        self.authority.is_none() && self.country.is_none() && self.currency.is_none()
    }

    /// Structural key with normalized casing; never built by string
    /// concatenation so dimension values cannot collide across fields.
    pub fn key(&self) -> ScopeKey {
        ScopeKey {
            authority: normalize_dimension(self.authority.as_deref()),
            country: normalize_dimension(self.country.as_deref()),
            currency: normalize_dimension(self.currency.as_deref()),
        }
    }

    /// Country-authority part of the scope, if the authority is pinned
    pub fn country_authority(&self) -> Option<CountryAuthority> {
        self.authority.as_deref().map(|authority| CountryAuthority {
            authority: authority.to_uppercase(),
            country: normalize_dimension(self.country.as_deref()),
        })
    }
}

impl std::fmt::Display for Scope {
    /// Human-readable form used for `meta.id` in error responses,
    /// wildcards rendered as `*`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.country.as_deref().unwrap_or("*"),
            self.authority.as_deref().unwrap_or("*"),
            self.currency.as_deref().unwrap_or("*"),
        )
    }
}

/// Structural map key for a full scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub authority: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dimension() {
        assert_eq!(normalize_dimension(Some("cy")), Some("CY".to_string()));
        assert_eq!(normalize_dimension(Some("  GM ")), Some("GM".to_string()));
        assert_eq!(normalize_dimension(Some("")), None);
        assert_eq!(normalize_dimension(Some("   ")), None);
        assert_eq!(normalize_dimension(None), None);
    }

    #[test]
    fn test_scope_new_uppercases() {
        let scope = Scope::new(Some("gm"), Some("cy"), Some("eur"));
        assert_eq!(scope.authority.as_deref(), Some("GM"));
        assert_eq!(scope.country.as_deref(), Some("CY"));
        assert_eq!(scope.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_scope_keys_case_insensitive() {
        let a = Scope::new(Some("gm"), Some("CY"), None);
        let b = Scope::new(Some("GM"), Some("cy"), None);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_scope_empty_string_is_wildcard() {
        let scope = Scope::new(Some(""), None, Some(" "));
        assert!(scope.is_wildcard());
    }

    #[test]
    fn test_scope_display() {
        let scope = Scope::new(Some("GM"), Some("CY"), None);
        assert_eq!(scope.to_string(), "CY:GM:*");
        assert_eq!(Scope::wildcard().to_string(), "*:*:*");
    }

    #[test]
    fn test_country_authority_preserves_null_country() {
        let scope = Scope::new(Some("GM"), None, None);
        let ca = scope.country_authority().unwrap();
        assert_eq!(ca.authority, "GM");
        assert_eq!(ca.country, None);
    }

    #[test]
    fn test_ca_key_distinct_fields_do_not_collide() {
        // "A:B" as authority vs authority A with country B must differ
        let a = CountryAuthority::new("A:B", None);
        let b = CountryAuthority::new("A", Some("B"));
        assert_ne!(a.key(), b.key());
    }
}
