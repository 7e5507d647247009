//! Business logic layer
//!
//! Services are generic over the repository traits they depend on and are
//! constructed explicitly at startup with concrete implementations; tests
//! inject mocks instead.

pub mod bank_accounts;
pub mod config_cleanup;
pub mod config_upsert;
pub mod credentials;
pub mod fields;
pub mod restrictions;
pub mod stp_rules;
pub mod transaction_config;
pub mod validation;

pub use bank_accounts::{BankAccountGroups, BankAccountsService};
pub use config_cleanup::ConfigUpsertCleaner;
pub use config_upsert::ConfigUpsertService;
pub use credentials::{CredentialGroups, CredentialsService};
pub use fields::{resolve_effective_fields, FieldsPayload, FieldsService};
pub use restrictions::{RestrictionGroups, RestrictionsService};
pub use stp_rules::{StpRuleGroups, StpRulesService};
pub use transaction_config::{build_transaction_config, group_by_currency, MethodConfigsService};
