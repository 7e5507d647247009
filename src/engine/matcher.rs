//! Scope matching and bounded-entity resolution
//!
//! A record dimension that is null or empty matches any requested value;
//! a pinned dimension matches only the same value, case-insensitively.
//! A pinned dimension never matches an absent requested value, so exact
//! matches always take priority over wildcards when resolving bindings.

use crate::domain::{Scope, ScopedRecord};

/// Whether one record dimension is bound to a requested value
pub fn is_bound(record_value: Option<&str>, requested: Option<&str>) -> bool {
    let record_value = record_value.map(str::trim).filter(|v| !v.is_empty());
    match (record_value, requested) {
        (None, _) => true,
        (Some(r), Some(q)) => r.eq_ignore_ascii_case(q.trim()),
        (Some(_), None) => false,
    }
}

/// Whether a record scope is bound to a requested scope:
/// every dimension the record pins must match the request.
pub fn scope_is_bound(record: &Scope, requested: &Scope) -> bool {
    is_bound(record.authority.as_deref(), requested.authority.as_deref())
        && is_bound(record.country.as_deref(), requested.country.as_deref())
        && is_bound(record.currency.as_deref(), requested.currency.as_deref())
}

/// Filter records down to those bound to the requested scope. O(N).
pub fn bounded_records<'a, P>(
    records: &'a [ScopedRecord<P>],
    requested: &Scope,
) -> Vec<&'a ScopedRecord<P>> {
    records
        .iter()
        .filter(|record| scope_is_bound(&record.scope, requested))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(authority: Option<&str>, country: Option<&str>, payload: &str) -> ScopedRecord<String> {
        ScopedRecord::new(Scope::new(authority, country, None), payload.to_string())
    }

    #[test]
    fn test_is_bound_wildcard_matches_anything() {
        assert!(is_bound(None, Some("GM")));
        assert!(is_bound(None, None));
        assert!(is_bound(Some(""), Some("GM")));
        assert!(is_bound(Some("  "), None));
    }

    #[test]
    fn test_is_bound_case_insensitive() {
        assert!(is_bound(Some("gm"), Some("GM")));
        assert!(is_bound(Some("GM"), Some("gm")));
        assert!(!is_bound(Some("GM"), Some("FSCM")));
    }

    #[test]
    fn test_pinned_dimension_never_matches_absent_request() {
        assert!(!is_bound(Some("GM"), None));
    }

    #[test]
    fn test_specificity() {
        // wildcard record and a GM-specific record
        let records = vec![record(None, None, "A"), record(Some("GM"), None, "B")];

        // request scope {authority: GM, country: CY}: both bind
        let bound = bounded_records(&records, &Scope::new(Some("GM"), Some("CY"), None));
        assert_eq!(bound.len(), 2);

        // request scope {authority: FSCM}: only the wildcard binds
        let bound = bounded_records(&records, &Scope::new(Some("FSCM"), None, None));
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].payload, "A");
    }

    #[test]
    fn test_case_insensitive_binding() {
        let records = vec![record(Some("gm"), None, "A")];
        let bound = bounded_records(&records, &Scope::new(Some("GM"), None, None));
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn test_all_pinned_dimensions_must_match() {
        let records = vec![record(Some("GM"), Some("CY"), "A")];
        let bound = bounded_records(&records, &Scope::new(Some("GM"), Some("MT"), None));
        assert!(bound.is_empty());
    }
}
