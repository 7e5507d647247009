//! Domain models and DTOs

pub mod bank_account;
pub mod credential;
pub mod field;
pub mod provider;
pub mod restriction;
pub mod rule_group;
pub mod scope;
pub mod stp_rule;
pub mod transaction_config;

pub use bank_account::{BankAccount, BankAccountConfig};
pub use credential::CredentialDetail;
pub use field::{FieldDefinition, FieldOption, FieldType};
pub use provider::{
    BoundMethod, CountryAuthorityMethod, CountryAuthorityMethodInput, CountryAuthorityRow, Method,
    NewCountryAuthorityMethod, NewProviderMethod, Provider, ProviderInput, ProviderMethod,
    UpsertConfigInput, UpsertConfigResponse,
};
pub use restriction::{Platform, PlatformRestriction, VersionCondition, VersionOperator};
pub use rule_group::{GroupParameters, RuleGroup, ScopedRecord};
pub use scope::{normalize_dimension, CaKey, CountryAuthority, Scope, ScopeKey};
pub use stp_rule::{StpRule, ALLOWED_STP_RULE_KEYS};
pub use transaction_config::{
    CurrencySetting, TransactionConfig, TransactionSetting, TransactionType,
};
