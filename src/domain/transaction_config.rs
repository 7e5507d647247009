//! Per-currency transaction configuration

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Transaction direction a config row applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Payout,
    Refund,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Deposit => write!(f, "deposit"),
            TransactionType::Payout => write!(f, "payout"),
            TransactionType::Refund => write!(f, "refund"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deposit" => Ok(TransactionType::Deposit),
            "payout" => Ok(TransactionType::Payout),
            "refund" => Ok(TransactionType::Refund),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for TransactionType {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for TransactionType {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for TransactionType {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        let s = self.to_string();
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s, buf)
    }
}

/// One transaction config row owned by a provider method
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionConfig {
    pub id: Uuid,
    pub provider_method_id: Uuid,
    pub currency: String,
    pub transaction_type: TransactionType,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub is_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

/// Amount bounds and toggle for one transaction type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Decimal>,
    #[serde(default)]
    pub is_enabled: bool,
}

/// Per-currency settings carried by an update request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySetting {
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<TransactionSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<TransactionSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<TransactionSetting>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("deposit", TransactionType::Deposit)]
    #[case("PAYOUT", TransactionType::Payout)]
    #[case("Refund", TransactionType::Refund)]
    fn test_transaction_type_parse(#[case] input: &str, #[case] expected: TransactionType) {
        assert_eq!(input.parse::<TransactionType>().unwrap(), expected);
    }

    #[test]
    fn test_transaction_type_parse_rejects_unknown() {
        assert!("transfer".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_currency_setting_deserialize_partial() {
        let setting: CurrencySetting = serde_json::from_str(
            r#"{"currency": "EUR", "deposit": {"min_amount": "10", "max_amount": "100", "is_enabled": true}}"#,
        )
        .unwrap();
        assert_eq!(setting.currency, "EUR");
        assert!(setting.deposit.is_some());
        assert!(setting.payout.is_none());
        assert!(setting.refund.is_none());
    }
}
