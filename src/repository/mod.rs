//! Data access layer
//!
//! One trait per table (or per concern), each with a MySQL implementation.
//! Traits are mocked in service tests; the transactional reconciliation
//! path goes through [`ConfigUnitOfWork`] instead of the per-table
//! repositories so every statement shares one transaction.

pub mod bank_account;
pub mod country_authority;
pub mod credential;
pub mod currency;
pub mod fields;
pub mod provider;
pub mod provider_method;
pub mod restriction;
pub mod stp_rule;
pub mod transaction_config;
pub mod tx;

pub use bank_account::{BankAccountRepository, BankAccountRepositoryImpl, BankAccountRow};
pub use country_authority::{CountryAuthorityRepository, CountryAuthorityRepositoryImpl};
pub use credential::{CredentialRepository, CredentialRepositoryImpl, CredentialRow};
pub use currency::{CurrencyRepository, CurrencyRepositoryImpl};
pub use fields::{
    FieldRecord, FieldsReader, FieldsWriter, LegacyFieldsRepository, ScopedFieldsRepository,
};
pub use provider::{ProviderRepository, ProviderRepositoryImpl};
pub use provider_method::{
    ProviderMethodLookup, ProviderMethodRepository, ProviderMethodRepositoryImpl,
};
pub use restriction::{RestrictionRepository, RestrictionRepositoryImpl, RestrictionRow};
pub use stp_rule::{StpRuleRepository, StpRuleRepositoryImpl, StpRuleRow};
pub use transaction_config::{TransactionConfigRepository, TransactionConfigRepositoryImpl};
pub use tx::{ConfigTx, ConfigUnitOfWork, MySqlConfigTx, MySqlConfigUnitOfWork};

#[cfg(test)]
pub use bank_account::MockBankAccountRepository;
#[cfg(test)]
pub use country_authority::MockCountryAuthorityRepository;
#[cfg(test)]
pub use credential::MockCredentialRepository;
#[cfg(test)]
pub use currency::MockCurrencyRepository;
#[cfg(test)]
pub use fields::{MockFieldsReader, MockFieldsWriter};
#[cfg(test)]
pub use provider::MockProviderRepository;
#[cfg(test)]
pub use provider_method::MockProviderMethodRepository;
#[cfg(test)]
pub use restriction::MockRestrictionRepository;
#[cfg(test)]
pub use stp_rule::MockStpRuleRepository;
#[cfg(test)]
pub use transaction_config::MockTransactionConfigRepository;
#[cfg(test)]
pub use tx::{MockConfigTx, MockConfigUnitOfWork};
