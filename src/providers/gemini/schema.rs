//! JSON Schema handling for the Gemini API.
//!
//! Google's `responseSchema` and function `parameters` accept an OpenAPI-style
//! subset of JSON Schema. [`sanitize_schema`] reduces a caller schema to that
//! subset; [`validate`] checks generated output against the caller's original
//! schema, since the API's own enforcement is best-effort.
//!
//! Preserved keywords: `type` (uppercased), `description`, `properties`,
//! `required`, `items`, `enum`, `nullable`. `const` becomes a one-value `enum`;
//! `anyOf`/`oneOf` collapse to their first non-null variant, `nullable` when a
//! `null` variant is present. Everything else is dropped.
//!
//! Every sanitized schema carries a `type`. OBJECT schemas always have at
//! least one property and ARRAY schemas always have `items`, since the API
//! rejects either when missing.

use serde_json::{Map, Value};

/// Property injected into OBJECT schemas that declare none.
const PLACEHOLDER_PROPERTY: &str = "details";

/// Reduce a JSON Schema to the subset Google accepts.
pub fn sanitize_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(obj) => sanitize_object(obj),
        _ => sanitize_object(&Map::new()),
    }
}

fn sanitize_object(obj: &Map<String, Value>) -> Value {
    if let Some(collapsed) = collapse_variants(obj) {
        return collapsed;
    }

    let mut result = Map::new();

    for (key, value) in obj {
        match key.as_str() {
            "type" => {
                let (google_type, nullable) = convert_type(value);
                result.insert("type".to_string(), Value::String(google_type));
                if nullable {
                    result.insert("nullable".to_string(), Value::Bool(true));
                }
            }
            "properties" => {
                if let Value::Object(props) = value {
                    let sanitized: Map<String, Value> = props
                        .iter()
                        .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                        .collect();
                    result.insert("properties".to_string(), Value::Object(sanitized));
                }
            }
            "items" => {
                // Tuple-style items: Google only takes a single schema.
                let items = match value {
                    Value::Array(arr) => arr.first().map(sanitize_schema),
                    other => Some(sanitize_schema(other)),
                };
                if let Some(items) = items {
                    result.insert("items".to_string(), items);
                }
            }
            "const" => {
                result.insert("enum".to_string(), Value::Array(vec![value.clone()]));
            }
            "required" | "enum" | "description" | "nullable" => {
                result.insert(key.clone(), value.clone());
            }
            _ => {}
        }
    }

    if !result.contains_key("type") {
        let inferred = if result.contains_key("items") {
            "ARRAY"
        } else if result.contains_key("enum") {
            "STRING"
        } else {
            "OBJECT"
        };
        result.insert("type".to_string(), Value::String(inferred.to_string()));
    }

    let google_type = result.get("type").and_then(Value::as_str).map(str::to_string);
    match google_type.as_deref() {
        Some("OBJECT") => {
            let has_properties = result
                .get("properties")
                .and_then(Value::as_object)
                .is_some_and(|p| !p.is_empty());
            if !has_properties {
                result.insert("properties".to_string(), placeholder_properties());
            }
        }
        Some("ARRAY") if !result.contains_key("items") => {
            result.insert("items".to_string(), string_schema());
        }
        _ => {}
    }

    // `required` may only name declared properties.
    if let Some(Value::Array(required)) = result.get("required") {
        let props = result.get("properties").and_then(Value::as_object);
        let valid: Vec<Value> = required
            .iter()
            .filter(|r| {
                r.as_str()
                    .zip(props)
                    .is_some_and(|(name, props)| props.contains_key(name))
            })
            .cloned()
            .collect();
        if valid.is_empty() {
            result.remove("required");
        } else {
            result.insert("required".to_string(), Value::Array(valid));
        }
    }

    Value::Object(result)
}

/// `anyOf`/`oneOf`: keep the first non-null variant. `[X, {type: null}]` is
/// how optional fields are usually emitted, and marks the result nullable.
fn collapse_variants(obj: &Map<String, Value>) -> Option<Value> {
    let variants = ["anyOf", "oneOf"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))?;
    let (nulls, others): (Vec<&Value>, Vec<&Value>) = variants
        .iter()
        .partition(|v| v.get("type").and_then(Value::as_str) == Some("null"));

    let mut collapsed = match others.first() {
        Some(first) => sanitize_schema(first),
        None if nulls.is_empty() => return None,
        None => string_schema(),
    };
    if let Value::Object(map) = &mut collapsed {
        if !nulls.is_empty() {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
        if let Some(desc) = obj.get("description") {
            map.entry("description").or_insert_with(|| desc.clone());
        }
    }
    Some(collapsed)
}

fn placeholder_properties() -> Value {
    let mut props = Map::new();
    let mut details = Map::new();
    details.insert("type".to_string(), Value::String("STRING".to_string()));
    details.insert(
        "description".to_string(),
        Value::String("Free-form details".to_string()),
    );
    props.insert(PLACEHOLDER_PROPERTY.to_string(), Value::Object(details));
    Value::Object(props)
}

fn string_schema() -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("STRING".to_string()));
    Value::Object(schema)
}

/// Returns the Google type name and whether `null` was among the types.
fn convert_type(type_value: &Value) -> (String, bool) {
    match type_value {
        Value::String(s) => (type_string_to_google(s), false),
        Value::Array(arr) => {
            let nullable = arr.iter().any(|t| t.as_str() == Some("null"));
            let first = arr
                .iter()
                .filter_map(Value::as_str)
                .find(|s| *s != "null")
                .map(type_string_to_google)
                .unwrap_or_else(|| "STRING".to_string());
            (first, nullable)
        }
        _ => ("OBJECT".to_string(), false),
    }
}

fn type_string_to_google(type_str: &str) -> String {
    match type_str.to_lowercase().as_str() {
        "string" => "STRING".to_string(),
        "number" => "NUMBER".to_string(),
        "integer" => "INTEGER".to_string(),
        "boolean" => "BOOLEAN".to_string(),
        "array" => "ARRAY".to_string(),
        "object" => "OBJECT".to_string(),
        _ => "STRING".to_string(),
    }
}

/// True when a parameters schema declares nothing worth sending.
pub fn is_empty_parameters(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(obj) => obj
            .get("properties")
            .and_then(Value::as_object)
            .is_none_or(Map::is_empty),
        _ => true,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check `value` against the structural parts of a JSON Schema: `type`,
/// `enum`, `const`, `properties`/`required`, `items`, `anyOf`/`oneOf`.
///
/// Returns a message naming the first offending path.
pub fn validate(value: &Value, schema: &Value) -> Result<(), String> {
    validate_at(value, schema, "$")
}

fn validate_at(value: &Value, schema: &Value, path: &str) -> Result<(), String> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    for key in ["anyOf", "oneOf"] {
        if let Some(Value::Array(variants)) = schema.get(key) {
            if !variants.iter().any(|v| validate_at(value, v, path).is_ok()) {
                return Err(format!("{path}: no {key} variant matches"));
            }
        }
    }

    if let Some(type_value) = schema.get("type") {
        let allowed: Vec<&str> = match type_value {
            Value::String(s) => vec![s.as_str()],
            Value::Array(arr) => arr.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        let nullable = schema.get("nullable").and_then(Value::as_bool) == Some(true);
        let matches = allowed.iter().any(|t| type_matches(value, t))
            || (nullable && value.is_null());
        if !allowed.is_empty() && !matches {
            return Err(format!(
                "{path}: expected {}, found {}",
                allowed.join(" or "),
                json_type_name(value)
            ));
        }
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            return Err(format!("{path}: {value} is not one of {}", Value::Array(options.clone())));
        }
    }

    if let Some(expected) = schema.get("const") {
        if expected != value {
            return Err(format!("{path}: expected constant {expected}"));
        }
    }

    if let Value::Object(obj) = value {
        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(name) {
                    return Err(format!("{path}: missing required property `{name}`"));
                }
            }
        }
        if let Some(Value::Object(props)) = schema.get("properties") {
            for (name, prop_schema) in props {
                if let Some(prop) = obj.get(name) {
                    validate_at(prop, prop_schema, &format!("{path}.{name}"))?;
                }
            }
        }
    }

    if let (Value::Array(items), Some(item_schema)) = (value, schema.get("items")) {
        for (i, item) in items.iter().enumerate() {
            validate_at(item, item_schema, &format!("{path}[{i}]"))?;
        }
    }

    Ok(())
}

fn type_matches(value: &Value, type_name: &str) -> bool {
    match type_name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => true,
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
