//! Declarative tool input schemas
//!
//! A schema lists the fields a tool accepts. Payloads are checked against it
//! before they are decoded into a tool's typed parameters, and it renders as a
//! JSON Schema object for `tools/list`.

use serde_json::{json, Map, Value};

use crate::errors::InvocationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Number,
    String,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Integers must fit in an `i64`; floats with an integral value are rejected.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.as_i64().is_some(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSchema {
    fields: Vec<FieldSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.field(name, kind, true, description)
    }

    pub fn optional(self, name: &str, kind: FieldKind, description: &str) -> Self {
        self.field(name, kind, false, description)
    }

    fn field(mut self, name: &str, kind: FieldKind, required: bool, description: &str) -> Self {
        self.fields.retain(|field| field.name != name);
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            required,
            description: Some(description.to_string()).filter(|text| !text.is_empty()),
        });
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Checks structure, presence and primitive types. Unknown fields are
    /// ignored. An explicit `null` only satisfies an optional field.
    pub fn validate(&self, payload: &Value) -> Result<(), InvocationError> {
        let Some(object) = payload.as_object() else {
            return Err(InvocationError::invalid_arguments(
                None,
                format!("arguments must be an object, got {}", json_type_name(payload)),
            ));
        };

        for field in &self.fields {
            match object.get(&field.name) {
                None if field.required => {
                    return Err(InvocationError::invalid_arguments(
                        Some(field.name.as_str()),
                        format!("missing required field `{}`", field.name),
                    ))
                }
                None => {}
                Some(Value::Null) if !field.required => {}
                Some(value) if field.kind.accepts(value) => {}
                Some(value) => {
                    return Err(InvocationError::invalid_arguments(
                        Some(field.name.as_str()),
                        format!(
                            "field `{}` must be {}, got {}",
                            field.name,
                            field.kind.as_str(),
                            json_type_name(value)
                        ),
                    ))
                }
            }
        }

        Ok(())
    }

    pub fn to_json_schema(&self) -> Value {
        let properties = self
            .fields
            .iter()
            .map(|field| {
                let mut property = Map::new();
                property.insert("type".to_string(), json!(field.kind.as_str()));
                if let Some(description) = &field.description {
                    property.insert("description".to_string(), json!(description));
                }
                (field.name.clone(), Value::Object(property))
            })
            .collect::<Map<_, _>>();

        let required = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.clone())
            .collect::<Vec<_>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_i64() => "integer",
        Value::Number(number) if number.is_u64() => "out-of-range integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
