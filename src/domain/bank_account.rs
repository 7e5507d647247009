//! Provider bank account payloads

use serde::{Deserialize, Serialize};

/// One settlement bank account, with provider-specific configuration entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub configs: Vec<BankAccountConfig>,
}

/// Key/value configuration entry of a bank account (iban, swift, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccountConfig {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_account_serde() {
        let account = BankAccount {
            name: "settlement".to_string(),
            account_type: "iban".to_string(),
            configs: vec![BankAccountConfig {
                key: "iban".to_string(),
                value: "CY17002001280000001200527600".to_string(),
            }],
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains(r#""type":"iban""#));
        let back: BankAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }
}
