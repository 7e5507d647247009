//! Content signatures for rule-group payloads
//!
//! Two payloads are the same rule set iff their canonical serialization is
//! byte-identical. The canonical form is JSON with recursively sorted object
//! keys; the full canonical string is used as the bucket key, so identical
//! content always collides and different content never does. Used purely to
//! bucket scopes by payload, never for security.

use crate::error::Result;
use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Stable content signature of a payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compute the content signature of any serializable payload
pub fn content_hash<T: Serialize>(payload: &T) -> Result<ContentHash> {
    let value = serde_json::to_value(payload).context("payload is not serializable")?;
    let mut out = String::new();
    write_canonical(&value, &mut out);
    Ok(ContentHash(out))
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            // BTreeMap iteration gives the deterministic key order
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (key, val)) in sorted.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({"b": 1, "a": {"y": 2, "x": 3}});
        let b = json!({"a": {"x": 3, "y": 2}, "b": 1});
        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_array_order_matters() {
        let a = json!([1, 2]);
        let b = json!([2, 1]);
        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_different_content_differs() {
        let a = json!({"key": "one", "value": "2"});
        let b = json!({"key": "one", "value": "3"});
        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_identical_structs_hash_equal() {
        use crate::domain::CredentialDetail;
        let a = vec![CredentialDetail::new("one", "2")];
        let b = vec![CredentialDetail::new("one", "2")];
        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn test_canonical_form_is_valid_json() {
        let payload = json!({"z": [true, null, "s"], "a": 1.5});
        let hash = content_hash(&payload).unwrap();
        let reparsed: Value = serde_json::from_str(hash.as_str()).unwrap();
        assert_eq!(reparsed, payload);
    }
}
