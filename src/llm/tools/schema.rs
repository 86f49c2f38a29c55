//! Parameter-schema checks for tool descriptors.
//!
//! Only the subset of JSON Schema the chat-completion endpoints use for tools
//! is understood: an object with typed `properties` and a `required` list.

use crate::error::{DispatchError, Result};
use crate::llm::tools::tool::{ToolArguments, ToolDescriptor};
use schemars::JsonSchema;
use serde_json::Value;

const PRIMITIVE_TYPES: [&str; 6] = ["string", "number", "integer", "boolean", "array", "object"];

/// Parameter schema for a typed argument struct.
///
/// Doc comments on the struct's fields become property descriptions.
pub fn parameters_for<T: JsonSchema>() -> Result<Value> {
    let mut schema = serde_json::to_value(schemars::schema_for!(T))?;
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    Ok(schema)
}

/// Check a descriptor before it is registered.
pub fn validate_descriptor(descriptor: &ToolDescriptor) -> Result<()> {
    let name = &descriptor.function.name;
    let invalid = |message: String| DispatchError::InvalidSchema {
        tool: name.clone(),
        message,
    };

    if name.trim().is_empty() {
        return Err(invalid("tool name is empty".to_string()));
    }

    let parameters = descriptor
        .function
        .parameters
        .as_object()
        .ok_or_else(|| invalid("parameters must be a JSON object".to_string()))?;

    if parameters.get("type").and_then(Value::as_str) != Some("object") {
        return Err(invalid("parameters must declare \"type\": \"object\"".to_string()));
    }

    let empty = serde_json::Map::new();
    let properties = match parameters.get("properties") {
        None => &empty,
        Some(Value::Object(properties)) => properties,
        Some(_) => return Err(invalid("properties must be an object".to_string())),
    };

    for (field, property) in properties {
        let declared = declared_types(property)
            .ok_or_else(|| invalid(format!("property '{}' does not declare a type", field)))?;
        if let Some(t) = declared.into_iter().find(|t| !PRIMITIVE_TYPES.contains(t) && *t != "null") {
            return Err(invalid(format!("property '{}' has unsupported type '{}'", field, t)));
        }
    }

    if let Some(required) = parameters.get("required") {
        let required =
            required.as_array().ok_or_else(|| invalid("required must be an array".to_string()))?;
        for entry in required {
            let field = entry
                .as_str()
                .ok_or_else(|| invalid("required entries must be strings".to_string()))?;
            if !properties.contains_key(field) {
                return Err(invalid(format!("required property '{}' is not declared", field)));
            }
        }
    }

    Ok(())
}

/// Check call arguments against a descriptor's schema.
///
/// Returns a message suitable for an error payload on the first violation.
pub fn check_arguments(
    descriptor: &ToolDescriptor,
    args: &ToolArguments,
) -> std::result::Result<(), String> {
    let parameters = &descriptor.function.parameters;

    if let Some(required) = parameters.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if args.get(field).map_or(true, Value::is_null) {
                return Err(format!("missing required argument '{}'", field));
            }
        }
    }

    if let Some(properties) = parameters.get("properties").and_then(Value::as_object) {
        for (field, value) in args {
            if value.is_null() {
                continue;
            }
            let Some(expected) = properties.get(field).and_then(declared_types) else {
                continue;
            };
            if !expected.iter().any(|t| matches_type(t, value)) {
                let expected = expected.join(" or ");
                return Err(format!("argument '{}' must be of type {}", field, expected));
            }
        }
    }

    Ok(())
}

/// `"type"` of a property, either a single name or a list of names
fn declared_types(property: &Value) -> Option<Vec<&str>> {
    match property.get("type")? {
        Value::String(t) => Some(vec![t.as_str()]),
        Value::Array(types) => types.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}
