//! End-to-end properties of the grouping/ungrouping engine

use payconf_core::domain::{CountryAuthority, RuleGroup, Scope, ScopedRecord};
use payconf_core::engine::{bounded_records, group_records, ungroup_records};
use pretty_assertions::assert_eq;

fn ca(authority: &str, country: Option<&str>) -> CountryAuthority {
    CountryAuthority::new(authority, country)
}

fn credential(key: &str) -> Vec<serde_json::Value> {
    vec![serde_json::json!({"key": key, "value": "secret"})]
}

#[test]
fn grouping_inverts_ungrouping() {
    // No duplicate scopes across groups, so the round trip is exact.
    // No-currency groups listed first to match the engine's output order.
    let groups = vec![
        RuleGroup::new(vec![ca("UKGC", None)], vec![], credential("merchant_id")),
        RuleGroup::new(
            vec![ca("GM", Some("CY")), ca("FSCM", Some("MT"))],
            vec!["EUR".to_string(), "USD".to_string()],
            credential("api_key"),
        ),
        RuleGroup::new(vec![ca("GM", Some("CY"))], vec!["GBP".to_string()], credential("token")),
    ];

    let records = ungroup_records(groups.clone());
    // 2 CAs x 2 currencies + 1 CA x 1 currency + 1 authority-wide row
    assert_eq!(records.len(), 6);

    let regrouped = group_records(records).unwrap();
    assert_eq!(regrouped, groups);
}

#[test]
fn grouping_is_idempotent() {
    let records = vec![
        ScopedRecord::new(Scope::new(Some("GM"), Some("CY"), Some("EUR")), credential("k")),
        ScopedRecord::new(Scope::new(Some("FSCM"), Some("MT"), Some("EUR")), credential("k")),
        ScopedRecord::new(Scope::new(Some("GM"), Some("CY"), Some("USD")), credential("k")),
    ];

    let once = group_records(records).unwrap();
    let twice = group_records(ungroup_records(once.clone())).unwrap();
    assert_eq!(twice, once);
}

#[test]
fn identical_payloads_merge_across_scopes() {
    let records = vec![
        ScopedRecord::new(Scope::new(Some("GM"), Some("CY"), None), credential("shared")),
        ScopedRecord::new(Scope::new(Some("FSCM"), Some("MT"), None), credential("shared")),
        ScopedRecord::new(Scope::new(Some("GM"), Some("GI"), None), credential("different")),
    ];

    let groups = group_records(records).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].parameters.country_authorities.len(), 2);
    assert_eq!(groups[1].parameters.country_authorities.len(), 1);
}

#[test]
fn currency_sets_split_within_one_payload() {
    // Same payload everywhere, but CY:GM trades EUR+USD while MT:FSCM
    // trades only EUR: two groups, keyed by currency set
    let records = vec![
        ScopedRecord::new(Scope::new(Some("GM"), Some("CY"), Some("EUR")), credential("k")),
        ScopedRecord::new(Scope::new(Some("GM"), Some("CY"), Some("USD")), credential("k")),
        ScopedRecord::new(Scope::new(Some("FSCM"), Some("MT"), Some("EUR")), credential("k")),
    ];

    let groups = group_records(records).unwrap();
    assert_eq!(groups.len(), 2);

    let cy: Vec<_> = groups
        .iter()
        .filter(|g| g.parameters.country_authorities[0].authority == "GM")
        .collect();
    assert_eq!(cy.len(), 1);
    assert_eq!(cy[0].parameters.currencies, vec!["EUR", "USD"]);
}

#[test]
fn authority_wide_rows_survive_a_round_trip_unexpanded() {
    let groups = vec![RuleGroup::new(vec![ca("UKGC", None)], vec![], credential("k"))];

    let records = ungroup_records(groups.clone());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].scope.authority.as_deref(), Some("UKGC"));
    assert_eq!(records[0].scope.country, None);

    let regrouped = group_records(records).unwrap();
    assert_eq!(regrouped[0].parameters.country_authorities[0].country, None);
}

#[test]
fn no_currency_groups_come_first() {
    let records = vec![
        ScopedRecord::new(Scope::new(Some("GM"), Some("CY"), Some("EUR")), credential("a")),
        ScopedRecord::new(Scope::new(Some("FSCM"), Some("MT"), None), credential("b")),
    ];

    let groups = group_records(records).unwrap();
    assert_eq!(groups.len(), 2);
    assert!(groups[0].parameters.currencies.is_empty());
    assert_eq!(groups[1].parameters.currencies, vec!["EUR"]);
}

#[test]
fn bounded_records_prefer_nothing_but_match_everything_applicable() {
    let records = vec![
        ScopedRecord::new(Scope::wildcard(), "common".to_string()),
        ScopedRecord::new(Scope::new(Some("GM"), None, None), "gm".to_string()),
        ScopedRecord::new(Scope::new(Some("GM"), Some("CY"), None), "gm-cy".to_string()),
    ];

    let bound = bounded_records(&records, &Scope::new(Some("GM"), Some("CY"), None));
    assert_eq!(bound.len(), 3);

    let bound = bounded_records(&records, &Scope::new(Some("GM"), Some("GI"), None));
    let payloads: Vec<_> = bound.iter().map(|r| r.payload.as_str()).collect();
    assert_eq!(payloads, vec!["common", "gm"]);

    let bound = bounded_records(&records, &Scope::new(Some("FSCM"), Some("MT"), None));
    let payloads: Vec<_> = bound.iter().map(|r| r.payload.as_str()).collect();
    assert_eq!(payloads, vec!["common"]);
}
