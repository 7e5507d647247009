//! Dynamic form field definitions

use serde::{Deserialize, Serialize};

/// Field widget type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Select,
    Bool,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Select => write!(f, "select"),
            FieldType::Bool => write!(f, "bool"),
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "select" => Ok(FieldType::Select),
            "bool" => Ok(FieldType::Bool),
            _ => Err(format!("Unknown field type: {}", s)),
        }
    }
}

/// Option entry for select fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub key: String,
    pub value: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

/// One dynamic form field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub key: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Validation pattern applied client-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub is_mandatory: bool,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

fn default_true() -> bool {
    true
}

impl FieldDefinition {
    pub fn text(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field_type: FieldType::Text,
            name: None,
            default_value: None,
            pattern: None,
            is_mandatory: false,
            is_enabled: true,
            options: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse() {
        assert_eq!("text".parse::<FieldType>().unwrap(), FieldType::Text);
        assert_eq!("SELECT".parse::<FieldType>().unwrap(), FieldType::Select);
        assert!("checkbox".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_definition_deserialize_defaults() {
        let field: FieldDefinition = serde_json::from_str(r#"{"key": "card_number"}"#).unwrap();
        assert_eq!(field.key, "card_number");
        assert_eq!(field.field_type, FieldType::Text);
        assert!(field.is_enabled);
        assert!(!field.is_mandatory);
        assert!(field.options.is_empty());
    }

    #[test]
    fn test_field_serde_stable() {
        let field = FieldDefinition::text("iban");
        let json = serde_json::to_string(&field).unwrap();
        let back: FieldDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
    }
}
