//! Declared parameter schemas and argument validation

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::error::ToolError;

/// Primitive parameter types a tool can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    /// Coerce a raw model-supplied value into this type.
    ///
    /// Models routinely quote numbers or emit bare identifiers, so the
    /// conversions are lenient in the lossless direction only.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParamType::String, Value::String(_)) => Some(value.clone()),
            (ParamType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (ParamType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (ParamType::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    Some(value.clone())
                } else {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.fract() == 0.0)
                        .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                        .map(|f| Value::from(f as i64))
                }
            }
            (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

            (ParamType::Number, Value::Number(_)) => Some(value.clone()),
            (ParamType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),

            (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },

            _ => None,
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ordered list of parameters a tool accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

/// Why a set of arguments was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required parameter `{name}` (expected {expected})")]
    Missing { name: String, expected: ParamType },

    #[error("parameter `{name}` expected {expected}, got {found} {preview}")]
    WrongType {
        name: String,
        expected: ParamType,
        found: &'static str,
        preview: String,
    },

    #[error("unexpected parameter `{name}`")]
    Unknown { name: String },
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping declaration order
    pub fn with(mut self, param: ParameterSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON-schema rendering used in the model's instructions
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(param.kind.as_str()));
            property.insert("description".to_string(), json!(param.description));
            if let Some(default) = &param.default {
                property.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check raw arguments against the declared parameters.
    ///
    /// Returns the coerced arguments with defaults filled in. Nothing is
    /// returned on failure, so a handler never sees a partial argument set.
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<ToolArguments, ValidationError> {
        if let Some(unknown) = raw.keys().find(|key| self.get(key).is_none()) {
            return Err(ValidationError::Unknown {
                name: unknown.clone(),
            });
        }

        let mut validated = Map::new();
        for param in &self.params {
            match raw.get(&param.name).filter(|v| !v.is_null()) {
                None => {
                    if let Some(default) = &param.default {
                        validated.insert(param.name.clone(), default.clone());
                    } else if param.required {
                        return Err(ValidationError::Missing {
                            name: param.name.clone(),
                            expected: param.kind,
                        });
                    }
                }
                Some(value) => {
                    let coerced =
                        param
                            .kind
                            .coerce(value)
                            .ok_or_else(|| ValidationError::WrongType {
                                name: param.name.clone(),
                                expected: param.kind,
                                found: json_type_name(value),
                                preview: preview(value),
                            })?;
                    validated.insert(param.name.clone(), coerced);
                }
            }
        }

        Ok(ToolArguments(validated))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 40 {
        format!("{}...", text.chars().take(37).collect::<String>())
    } else {
        text
    }
}

/// Arguments that passed schema validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(Map<String, Value>);

impl ToolArguments {
    /// Get a typed argument
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ToolError> {
        let value = self.0.get(name).ok_or_else(|| ToolError::InvalidParameters {
            name: name.to_string(),
            message: "argument not supplied".to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| ToolError::InvalidParameters {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Get an optional typed argument
    pub fn get_optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ToolError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(name).map(Some),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_schema() -> ParameterSchema {
        ParameterSchema::new()
            .with(ParameterSpec::required(
                "search_term",
                ParamType::String,
                "Text to look for",
            ))
            .with(
                ParameterSpec::optional("limit", ParamType::Integer, "Maximum results")
                    .with_default(10),
            )
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_json_schema_keeps_declaration_order() {
        let schema = search_schema().to_json_schema();
        let keys: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["search_term", "limit"]);
        assert_eq!(schema["required"], json!(["search_term"]));
        assert_eq!(schema["properties"]["limit"]["default"], json!(10));
    }

    #[test]
    fn test_fills_defaults() {
        let validated = search_schema()
            .validate(&args(json!({"search_term": "Engineering"})))
            .unwrap();
        assert_eq!(validated.get::<String>("search_term").unwrap(), "Engineering");
        assert_eq!(validated.get::<i64>("limit").unwrap(), 10);
    }

    #[test]
    fn test_missing_required_names_parameter() {
        let err = search_schema().validate(&Map::new()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Missing {
                name: "search_term".to_string(),
                expected: ParamType::String
            }
        );
        assert!(err.to_string().contains("search_term"));

        let err = search_schema()
            .validate(&args(json!({"search_term": null})))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Missing { .. }));
    }

    #[test]
    fn test_rejects_unknown_parameter() {
        let err = search_schema()
            .validate(&args(json!({"search_term": "a", "sort": "name"})))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Unknown {
                name: "sort".to_string()
            }
        );
    }

    #[test]
    fn test_coercion_rules() {
        assert_eq!(ParamType::Integer.coerce(&json!("25")), Some(json!(25)));
        assert_eq!(ParamType::Integer.coerce(&json!(5.0)), Some(json!(5)));
        assert_eq!(ParamType::Integer.coerce(&json!(5.5)), None);
        assert_eq!(ParamType::Integer.coerce(&json!("ten")), None);
        assert_eq!(ParamType::Number.coerce(&json!("2.5")), Some(json!(2.5)));
        assert_eq!(ParamType::Boolean.coerce(&json!("TRUE")), Some(json!(true)));
        assert_eq!(ParamType::Boolean.coerce(&json!(1)), None);
        assert_eq!(ParamType::String.coerce(&json!(42)), Some(json!("42")));
        assert_eq!(ParamType::String.coerce(&json!(["a"])), None);
    }

    #[test]
    fn test_wrong_type_reports_expected_and_found() {
        let err = search_schema()
            .validate(&args(json!({"search_term": "a", "limit": "many"})))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`limit`"));
        assert!(message.contains("expected integer"));
        assert!(message.contains("got string"));
    }
}
