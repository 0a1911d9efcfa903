//! Canonical JSON form of a protocol.
//!
//! The canonical form is what lowering writes to disk and what the code
//! generator reads. Key order is fixed, so identical protocols always
//! produce byte-identical text.

use crate::parser::is_reserved_key;
use crate::types::{Field, Message, Props, Protocol, Schema, TypeDef};
use serde_json::{Map, Value};

impl Protocol {
    /// Converts the protocol to its canonical JSON value.
    #[must_use]
    pub fn to_canonical_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("protocol".into(), Value::String(self.name.clone()));
        insert_opt(&mut obj, "namespace", self.namespace.as_deref());
        insert_opt(&mut obj, "doc", self.doc.as_deref());
        insert_props(&mut obj, &self.props);
        obj.insert(
            "types".into(),
            Value::Array(self.types.iter().map(type_to_json).collect()),
        );

        let mut messages = Map::new();
        for message in &self.messages {
            messages.insert(message.name.clone(), message_to_json(message));
        }
        obj.insert("messages".into(), Value::Object(messages));

        Value::Object(obj)
    }

    /// Returns the canonical text form (pretty-printed JSON).
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        let mut text = serde_json::to_string_pretty(&self.to_canonical_json())
            .unwrap_or_else(|_| String::from("{}"));
        text.push('\n');
        text
    }
}

impl Schema {
    /// Converts the schema to its canonical JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        if let Some(name) = self.primitive_name() {
            return Value::String(name.to_string());
        }
        match self {
            Self::Array(items) => {
                let mut obj = Map::new();
                obj.insert("type".into(), Value::String("array".into()));
                obj.insert("items".into(), items.to_json());
                Value::Object(obj)
            }
            Self::Map(values) => {
                let mut obj = Map::new();
                obj.insert("type".into(), Value::String("map".into()));
                obj.insert("values".into(), values.to_json());
                Value::Object(obj)
            }
            Self::Union(branches) => Value::Array(branches.iter().map(Schema::to_json).collect()),
            Self::Named(name) => Value::String(name.clone()),
            _ => Value::Null,
        }
    }
}

fn type_to_json(type_def: &TypeDef) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::String(type_def.kind_name().into()));
    obj.insert("name".into(), Value::String(type_def.name().into()));
    insert_opt(&mut obj, "namespace", type_def.namespace());
    insert_opt(&mut obj, "doc", type_def.doc());
    insert_props(&mut obj, type_def.props());

    match type_def {
        TypeDef::Record(record) => {
            obj.insert(
                "fields".into(),
                Value::Array(record.fields.iter().map(field_to_json).collect()),
            );
        }
        TypeDef::Enum(enum_def) => {
            obj.insert(
                "symbols".into(),
                Value::Array(
                    enum_def
                        .symbols
                        .iter()
                        .map(|s| Value::String(s.clone()))
                        .collect(),
                ),
            );
        }
        TypeDef::Fixed(fixed) => {
            obj.insert("size".into(), Value::from(fixed.size));
        }
    }

    Value::Object(obj)
}

fn field_to_json(field: &Field) -> Value {
    let mut obj = Map::new();
    obj.insert("name".into(), Value::String(field.name.clone()));
    obj.insert("type".into(), field.schema.to_json());
    insert_opt(&mut obj, "doc", field.doc.as_deref());
    if let Some(default) = &field.default {
        obj.insert("default".into(), default.clone());
    }
    insert_props(&mut obj, &field.props);
    Value::Object(obj)
}

fn message_to_json(message: &Message) -> Value {
    let mut obj = Map::new();
    insert_opt(&mut obj, "doc", message.doc.as_deref());
    insert_props(&mut obj, &message.props);
    obj.insert(
        "request".into(),
        Value::Array(message.request.iter().map(field_to_json).collect()),
    );
    obj.insert("response".into(), message.response.to_json());
    if !message.errors.is_empty() {
        obj.insert(
            "errors".into(),
            Value::Array(
                message
                    .errors
                    .iter()
                    .map(|e| Value::String(e.clone()))
                    .collect(),
            ),
        );
    }
    if message.one_way {
        obj.insert("one-way".into(), Value::Bool(true));
    }
    Value::Object(obj)
}

fn insert_opt(obj: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        obj.insert(key.into(), Value::String(value.to_string()));
    }
}

/// Copies custom properties; reserved keys never override structure.
fn insert_props(obj: &mut Map<String, Value>, props: &Props) {
    for (key, value) in props {
        if is_reserved_key(key) {
            continue;
        }
        obj.insert(key.clone(), value.clone());
    }
}
