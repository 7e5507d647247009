//! Provider, method and mapping entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Payment provider entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Provider {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Provider {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: String::new(),
            name: String::new(),
            is_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payment method entity (cards, wallets, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Method {
    pub id: Uuid,
    pub code: String,
    pub name: String,
}

/// Country-authority pair as persisted (a country regulated by an authority)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CountryAuthorityRow {
    pub id: Uuid,
    pub country: String,
    pub authority: String,
}

/// CAM: a method enabled/disabled for one country-authority pair
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CountryAuthorityMethod {
    pub id: Uuid,
    pub method_id: Uuid,
    pub country_authority_id: Uuid,
    pub is_enabled: bool,
    pub deposits_order: i32,
}

/// New CAM row; starts disabled until an operator enables it
#[derive(Debug, Clone)]
pub struct NewCountryAuthorityMethod {
    pub id: Uuid,
    pub method_id: Uuid,
    pub country_authority_id: Uuid,
}

/// PM: a provider's binding to a CAM, owning currency-level settings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProviderMethod {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub country_authority_method_id: Uuid,
    pub is_enabled: bool,
}

/// New PM row; starts disabled
#[derive(Debug, Clone)]
pub struct NewProviderMethod {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub country_authority_method_id: Uuid,
}

lazy_static::lazy_static! {
    /// Provider/method codes: lowercase alphanumeric with underscores
    pub static ref CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]+(?:_[a-z0-9]+)*$").unwrap();
    /// ISO 3166-1 alpha-2 country codes
    pub static ref COUNTRY_REGEX: regex::Regex = regex::Regex::new(r"^[A-Za-z]{2}$").unwrap();
}

fn validate_code(code: &str) -> Result<(), validator::ValidationError> {
    if CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_code"))
    }
}

fn validate_country(country: &str) -> Result<(), validator::ValidationError> {
    if COUNTRY_REGEX.is_match(country) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_country"))
    }
}

/// Provider part of an upsert request; matched by code
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProviderInput {
    #[validate(length(min = 1, max = 63), custom(function = "validate_code"))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// One desired country-authority-method mapping entry
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CountryAuthorityMethodInput {
    #[validate(custom(function = "validate_country"))]
    pub country: String,
    #[validate(length(min = 1, max = 63))]
    pub authority: String,
    #[validate(length(min = 1, max = 63), custom(function = "validate_code"))]
    pub method: String,
}

/// Full upsert request: the database must reflect exactly this mapping
/// for the provider afterwards.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertConfigInput {
    #[validate(nested)]
    pub provider: ProviderInput,
    #[validate(nested)]
    pub country_authority_methods: Vec<CountryAuthorityMethodInput>,
}

/// One provider↔method binding in the upsert response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundMethod {
    pub country: String,
    pub authority: String,
    pub method: String,
    pub is_enabled: bool,
}

/// Upsert response: the provider plus the fresh CAM↔PM mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertConfigResponse {
    pub provider: Provider,
    pub country_authority_methods: Vec<BoundMethod>,
}
