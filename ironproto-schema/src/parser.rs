//! Canonical schema parser.
//!
//! This module reads the canonical JSON protocol document back into the
//! internal representation. Named types must be declared in the `types`
//! array; fields refer to them by name.

use crate::error::ParseError;
use crate::types::{
    EnumDef, Field, FixedDef, Message, Props, Protocol, RecordDef, Schema, TypeDef,
};
use crate::validation::validate_protocol;
use serde_json::{Map, Value};

const PROTOCOL_KEYS: &[&str] = &["protocol", "namespace", "doc", "types", "messages"];
const TYPE_KEYS: &[&str] = &["type", "name", "namespace", "doc", "fields", "symbols", "size"];
const FIELD_KEYS: &[&str] = &["name", "type", "doc", "default"];
const MESSAGE_KEYS: &[&str] = &["doc", "request", "response", "errors", "one-way"];

/// Returns true if `key` has a fixed meaning somewhere in the canonical form
/// and therefore cannot be used as a custom property.
#[must_use]
pub fn is_reserved_key(key: &str) -> bool {
    [PROTOCOL_KEYS, TYPE_KEYS, FIELD_KEYS, MESSAGE_KEYS]
        .iter()
        .any(|keys| keys.contains(&key))
}

/// Parses a canonical protocol document from a string.
///
/// # Arguments
/// * `json` - Canonical JSON content
///
/// # Returns
/// Parsed and validated protocol.
///
/// # Errors
/// Returns `ParseError` if the JSON is malformed, the document structure is
/// wrong, or the protocol fails validation.
pub fn parse_protocol(json: &str) -> Result<Protocol, ParseError> {
    let value: Value = serde_json::from_str(json)?;
    let protocol = protocol_from_json(&value)?;
    validate_protocol(&protocol)?;
    Ok(protocol)
}

/// Builds a protocol from a JSON value without validating it.
///
/// # Errors
/// Returns `ParseError` if the document structure is wrong.
pub fn protocol_from_json(value: &Value) -> Result<Protocol, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::structure("protocol document must be a JSON object"))?;

    let name = required_str(obj, "protocol", "protocol")?;
    let namespace = optional_str(obj, "namespace", "protocol")?;

    let mut protocol = Protocol::new(name, namespace);
    protocol.doc = optional_str(obj, "doc", "protocol")?;
    protocol.props = collect_props(obj, PROTOCOL_KEYS);

    if let Some(types) = obj.get("types") {
        let types = types
            .as_array()
            .ok_or_else(|| ParseError::invalid_attr("protocol", "types", types.to_string()))?;
        for type_value in types {
            protocol.add_type(type_from_json(type_value)?);
        }
    }

    if let Some(messages) = obj.get("messages") {
        let messages = messages.as_object().ok_or_else(|| {
            ParseError::invalid_attr("protocol", "messages", messages.to_string())
        })?;
        for (name, message_value) in messages {
            protocol.messages.push(message_from_json(name, message_value)?);
        }
    }

    Ok(protocol)
}

/// Parses a named type definition.
fn type_from_json(value: &Value) -> Result<TypeDef, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::structure(format!("type definition must be an object: {value}")))?;

    let kind = required_str(obj, "type", "type definition")?;
    let name = required_str(obj, "name", "type definition")?;
    let element = format!("{kind} '{name}'");
    let namespace = optional_str(obj, "namespace", &element)?;
    let doc = optional_str(obj, "doc", &element)?;
    let props = collect_props(obj, TYPE_KEYS);

    let type_def = match kind.as_str() {
        "record" | "error" => {
            let fields = obj
                .get("fields")
                .ok_or_else(|| ParseError::missing_attr(&element, "fields"))?
                .as_array()
                .ok_or_else(|| ParseError::invalid_attr(&element, "fields", "non-array"))?
                .iter()
                .map(field_from_json)
                .collect::<Result<Vec<_>, _>>()?;
            TypeDef::Record(RecordDef {
                name,
                namespace,
                doc,
                props,
                fields,
                is_error: kind == "error",
            })
        }
        "enum" => {
            let symbols = obj
                .get("symbols")
                .ok_or_else(|| ParseError::missing_attr(&element, "symbols"))?
                .as_array()
                .ok_or_else(|| ParseError::invalid_attr(&element, "symbols", "non-array"))?
                .iter()
                .map(|s| {
                    s.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ParseError::invalid_attr(&element, "symbols", s.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            TypeDef::Enum(EnumDef {
                name,
                namespace,
                doc,
                props,
                symbols,
            })
        }
        "fixed" => {
            let size_value = obj
                .get("size")
                .ok_or_else(|| ParseError::missing_attr(&element, "size"))?;
            let size = size_value
                .as_u64()
                .and_then(|s| usize::try_from(s).ok())
                .ok_or_else(|| ParseError::invalid_attr(&element, "size", size_value.to_string()))?;
            TypeDef::Fixed(FixedDef {
                name,
                namespace,
                doc,
                props,
                size,
            })
        }
        other => return Err(ParseError::invalid_attr("type definition", "type", other)),
    };

    Ok(type_def)
}

/// Parses a record field or message parameter.
fn field_from_json(value: &Value) -> Result<Field, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::structure(format!("field must be an object: {value}")))?;
    let name = required_str(obj, "name", "field")?;
    let element = format!("field '{name}'");
    let schema_value = obj
        .get("type")
        .ok_or_else(|| ParseError::missing_attr(&element, "type"))?;

    Ok(Field {
        schema: schema_from_json(schema_value)?,
        default: obj.get("default").cloned(),
        doc: optional_str(obj, "doc", &element)?,
        props: collect_props(obj, FIELD_KEYS),
        name,
    })
}

/// Parses a message definition.
fn message_from_json(name: &str, value: &Value) -> Result<Message, ParseError> {
    let element = format!("message '{name}'");
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::structure(format!("{element} must be an object")))?;

    let request = obj
        .get("request")
        .ok_or_else(|| ParseError::missing_attr(&element, "request"))?
        .as_array()
        .ok_or_else(|| ParseError::invalid_attr(&element, "request", "non-array"))?
        .iter()
        .map(field_from_json)
        .collect::<Result<Vec<_>, _>>()?;

    let response = obj
        .get("response")
        .ok_or_else(|| ParseError::missing_attr(&element, "response"))
        .and_then(schema_from_json)?;

    let errors = match obj.get("errors") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|e| {
                e.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ParseError::invalid_attr(&element, "errors", e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(ParseError::invalid_attr(&element, "errors", other.to_string()));
        }
    };

    let one_way = match obj.get("one-way") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(ParseError::invalid_attr(&element, "one-way", other.to_string()));
        }
    };

    Ok(Message {
        name: name.to_string(),
        doc: optional_str(obj, "doc", &element)?,
        props: collect_props(obj, MESSAGE_KEYS),
        request,
        response,
        errors,
        one_way,
    })
}

/// Parses a field schema.
///
/// # Errors
/// Returns `ParseError` for unknown shapes and inline named type definitions.
pub fn schema_from_json(value: &Value) -> Result<Schema, ParseError> {
    match value {
        Value::String(name) => Ok(Schema::primitive(name).unwrap_or_else(|| Schema::Named(name.clone()))),
        Value::Array(branches) => branches
            .iter()
            .map(schema_from_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Schema::Union),
        Value::Object(obj) => {
            let kind = required_str(obj, "type", "schema")?;
            match kind.as_str() {
                "array" => {
                    let items = obj
                        .get("items")
                        .ok_or_else(|| ParseError::missing_attr("array schema", "items"))?;
                    Ok(Schema::Array(Box::new(schema_from_json(items)?)))
                }
                "map" => {
                    let values = obj
                        .get("values")
                        .ok_or_else(|| ParseError::missing_attr("map schema", "values"))?;
                    Ok(Schema::Map(Box::new(schema_from_json(values)?)))
                }
                "record" | "error" | "enum" | "fixed" => Err(ParseError::structure(format!(
                    "inline {kind} definitions are not supported; declare it in 'types'"
                ))),
                other => Schema::primitive(other)
                    .ok_or_else(|| ParseError::invalid_attr("schema", "type", other)),
            }
        }
        other => Err(ParseError::structure(format!("invalid schema: {other}"))),
    }
}

fn required_str(obj: &Map<String, Value>, key: &str, element: &str) -> Result<String, ParseError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ParseError::invalid_attr(element, key, other.to_string())),
        None => Err(ParseError::missing_attr(element, key)),
    }
}

fn optional_str(
    obj: &Map<String, Value>,
    key: &str,
    element: &str,
) -> Result<Option<String>, ParseError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(ParseError::invalid_attr(element, key, other.to_string())),
    }
}

fn collect_props(obj: &Map<String, Value>, reserved: &[&str]) -> Props {
    obj.iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keys() {
        for key in ["type", "name", "doc", "default", "one-way", "protocol", "messages", "size"] {
            assert!(is_reserved_key(key), "{key} not reserved");
        }
        assert!(!is_reserved_key("java-class"));
        assert!(!is_reserved_key("aliases"));
    }

    const SIMPLE_PROTOCOL: &str = r#"{
  "protocol": "Mail",
  "namespace": "org.example.mail",
  "doc": "Sends mail.",
  "types": [
    {"type": "enum", "name": "Priority", "symbols": ["LOW", "HIGH"]},
    {"type": "fixed", "name": "Digest", "size": 16},
    {"type": "record", "name": "Envelope", "fields": [
      {"name": "to", "type": "string"},
      {"name": "cc", "type": {"type": "array", "items": "string"}, "default": []},
      {"name": "priority", "type": "Priority", "java-class": "x"},
      {"name": "digest", "type": ["null", "Digest"], "default": null}
    ]},
    {"type": "error", "name": "Bounce", "fields": [{"name": "reason", "type": "string"}]}
  ],
  "messages": {
    "send": {
      "request": [{"name": "envelope", "type": "Envelope"}],
      "response": "string",
      "errors": ["Bounce"]
    },
    "flush": {"request": [], "response": "null", "one-way": true}
  }
}"#;

    #[test]
    fn test_parse_simple_protocol() {
        let protocol = parse_protocol(SIMPLE_PROTOCOL).expect("Failed to parse protocol");

        assert_eq!(protocol.name, "Mail");
        assert_eq!(protocol.namespace.as_deref(), Some("org.example.mail"));
        assert_eq!(protocol.doc.as_deref(), Some("Sends mail."));
        assert_eq!(protocol.types.len(), 4);
        assert_eq!(protocol.messages.len(), 2);
    }

    #[test]
    fn test_parse_types() {
        let protocol = parse_protocol(SIMPLE_PROTOCOL).expect("Failed to parse protocol");

        assert!(protocol.get_type("Priority").unwrap().is_enum());
        assert!(protocol.get_type("Digest").unwrap().is_fixed());
        assert!(protocol.get_type("Bounce").unwrap().is_error());

        let TypeDef::Record(envelope) = protocol.get_type("Envelope").unwrap() else {
            panic!("expected record");
        };
        assert_eq!(envelope.fields.len(), 4);
        assert_eq!(
            envelope.get_field("cc").unwrap().schema,
            Schema::Array(Box::new(Schema::String))
        );
        assert_eq!(
            envelope.get_field("digest").unwrap().default,
            Some(Value::Null)
        );
        assert_eq!(
            envelope.get_field("priority").unwrap().props.get("java-class"),
            Some(&Value::String("x".into()))
        );
    }

    #[test]
    fn test_parse_messages() {
        let protocol = parse_protocol(SIMPLE_PROTOCOL).expect("Failed to parse protocol");

        let send = protocol.get_message("send").unwrap();
        assert_eq!(send.request.len(), 1);
        assert_eq!(send.response, Schema::String);
        assert_eq!(send.errors, vec!["Bounce".to_string()]);
        assert!(!send.one_way);

        let flush = protocol.get_message("flush").unwrap();
        assert!(flush.one_way);
        assert!(flush.response.is_null());
    }

    #[test]
    fn test_canonical_round_trip() {
        let protocol = parse_protocol(SIMPLE_PROTOCOL).expect("Failed to parse protocol");
        let text = protocol.to_canonical_string();
        let reparsed = parse_protocol(&text).expect("Failed to reparse protocol");
        assert_eq!(protocol, reparsed);
        assert_eq!(text, reparsed.to_canonical_string());
    }

    #[test]
    fn test_missing_protocol_name() {
        let err = parse_protocol(r#"{"types": []}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingAttribute { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_protocol("{\"protocol\": ").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
        assert!(err.position().is_some());
    }

    #[test]
    fn test_inline_named_type_rejected() {
        let json = r#"{"protocol": "P", "types": [{"type": "record", "name": "R", "fields": [
            {"name": "inner", "type": {"type": "record", "name": "Inner", "fields": []}}
        ]}]}"#;
        let err = parse_protocol(json).unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure { .. }));
    }

    #[test]
    fn test_unresolved_reference_fails_validation() {
        let json = r#"{"protocol": "P", "types": [{"type": "record", "name": "R", "fields": [
            {"name": "x", "type": "Missing"}
        ]}]}"#;
        let err = parse_protocol(json).unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }

    #[test]
    fn test_fixed_size_must_be_unsigned() {
        let json = r#"{"protocol": "P", "types": [{"type": "fixed", "name": "F", "size": -1}]}"#;
        let err = parse_protocol(json).unwrap_err();
        assert!(matches!(err, ParseError::InvalidAttribute { .. }));
    }
}
