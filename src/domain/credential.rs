//! Provider credential payloads

use serde::{Deserialize, Serialize};

/// One credential key/value entry (merchant ids, API keys, terminal ids, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialDetail {
    pub key: String,
    pub value: String,
}

impl CredentialDetail {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_serde() {
        let cred = CredentialDetail::new("merchant_id", "m-123");
        let json = serde_json::to_string(&cred).unwrap();
        assert_eq!(json, r#"{"key":"merchant_id","value":"m-123"}"#);
    }
}
