//! Protocol validation utilities.
//!
//! This module provides validation functions for protocols to ensure
//! correctness and consistency before code generation.

use crate::error::SchemaError;
use crate::types::{EnumDef, Field, FixedDef, Message, Protocol, RecordDef, Schema, TypeDef};
use std::collections::HashSet;

/// Validates a parsed protocol for correctness.
///
/// # Arguments
/// * `protocol` - The protocol to validate
///
/// # Returns
/// Ok(()) if valid, or SchemaError describing the issue.
///
/// # Errors
/// Returns `SchemaError` if validation fails.
pub fn validate_protocol(protocol: &Protocol) -> Result<(), SchemaError> {
    if !is_identifier(&protocol.name) {
        return Err(SchemaError::validation(format!(
            "invalid protocol name '{}'",
            protocol.name
        )));
    }
    if let Some(ns) = protocol.namespace.as_deref() {
        validate_namespace(ns, &format!("protocol '{}'", protocol.name))?;
    }
    validate_types(protocol)?;
    validate_messages(protocol)?;
    Ok(())
}

/// Validates all named type definitions in the protocol.
fn validate_types(protocol: &Protocol) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for type_def in &protocol.types {
        let full_name = protocol.full_name_of(type_def);
        if !seen.insert(full_name.clone()) {
            return Err(SchemaError::duplicate("type", full_name));
        }
        if !is_identifier(type_def.name()) {
            return Err(SchemaError::validation(format!(
                "invalid type name '{}'",
                type_def.name()
            )));
        }
        if let Some(ns) = type_def.namespace() {
            validate_namespace(ns, &format!("type '{}'", type_def.name()))?;
        }

        match type_def {
            TypeDef::Record(record) => validate_record(protocol, record)?,
            TypeDef::Enum(enum_def) => validate_enum(enum_def)?,
            TypeDef::Fixed(fixed) => validate_fixed(fixed)?,
        }
    }
    Ok(())
}

/// Validates a record or error definition.
fn validate_record(protocol: &Protocol, record: &RecordDef) -> Result<(), SchemaError> {
    validate_fields(protocol, &record.fields, &format!("record '{}'", record.name))
}

/// Validates a list of fields (record fields or message parameters).
fn validate_fields(protocol: &Protocol, fields: &[Field], owner: &str) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::duplicate(
                "field",
                format!("{}.{}", owner, field.name),
            ));
        }
        if !is_identifier(&field.name) {
            return Err(SchemaError::validation(format!(
                "invalid field name '{}' in {}",
                field.name, owner
            )));
        }
        let context = format!("field '{}' of {}", field.name, owner);
        validate_schema(protocol, &field.schema, &context)?;
    }
    Ok(())
}

/// Validates a field schema: references resolve and unions are well formed.
fn validate_schema(protocol: &Protocol, schema: &Schema, context: &str) -> Result<(), SchemaError> {
    match schema {
        Schema::Named(name) => {
            if !protocol.has_type(name) {
                return Err(SchemaError::not_found(name, context));
            }
        }
        Schema::Array(items) | Schema::Map(items) => validate_schema(protocol, items, context)?,
        Schema::Union(branches) => {
            if branches.is_empty() {
                return Err(SchemaError::InvalidUnion {
                    context: context.to_string(),
                    reason: "union has no branches".to_string(),
                });
            }
            let mut seen = HashSet::new();
            for branch in branches {
                if matches!(branch, Schema::Union(_)) {
                    return Err(SchemaError::InvalidUnion {
                        context: context.to_string(),
                        reason: "unions may not directly contain unions".to_string(),
                    });
                }
                if !seen.insert(branch_key(protocol, branch)) {
                    return Err(SchemaError::InvalidUnion {
                        context: context.to_string(),
                        reason: format!("duplicate branch '{}'", branch_key(protocol, branch)),
                    });
                }
                validate_schema(protocol, branch, context)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Identity of a union branch: primitives and containers by kind, named
/// types by full name.
fn branch_key(protocol: &Protocol, branch: &Schema) -> String {
    match branch {
        Schema::Named(name) => protocol
            .get_type(name)
            .map(|t| protocol.full_name_of(t))
            .unwrap_or_else(|| name.clone()),
        Schema::Array(_) => "array".to_string(),
        Schema::Map(_) => "map".to_string(),
        other => other.primitive_name().unwrap_or("union").to_string(),
    }
}

/// Validates an enum type definition.
fn validate_enum(enum_def: &EnumDef) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for symbol in &enum_def.symbols {
        if !is_identifier(symbol) {
            return Err(SchemaError::validation(format!(
                "invalid symbol '{}' in enum '{}'",
                symbol, enum_def.name
            )));
        }
        if !seen.insert(symbol.as_str()) {
            return Err(SchemaError::duplicate(
                "enum symbol",
                format!("{}.{}", enum_def.name, symbol),
            ));
        }
    }
    Ok(())
}

/// Validates a fixed type definition.
fn validate_fixed(fixed: &FixedDef) -> Result<(), SchemaError> {
    if fixed.size == 0 {
        return Err(SchemaError::validation(format!(
            "fixed '{}' must have a non-zero size",
            fixed.name
        )));
    }
    Ok(())
}

/// Validates all messages in the protocol.
fn validate_messages(protocol: &Protocol) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for message in &protocol.messages {
        if !seen.insert(message.name.as_str()) {
            return Err(SchemaError::duplicate("message", &message.name));
        }
        validate_message(protocol, message)?;
    }
    Ok(())
}

/// Validates a single message definition.
fn validate_message(protocol: &Protocol, message: &Message) -> Result<(), SchemaError> {
    if !is_identifier(&message.name) {
        return Err(SchemaError::validation(format!(
            "invalid message name '{}'",
            message.name
        )));
    }

    let owner = format!("message '{}'", message.name);
    validate_fields(protocol, &message.request, &owner)?;
    validate_schema(protocol, &message.response, &format!("response of {owner}"))?;

    for error in &message.errors {
        match protocol.get_type(error) {
            Some(type_def) if type_def.is_error() => {}
            Some(_) => {
                return Err(SchemaError::NotAnError {
                    message: message.name.clone(),
                    name: error.clone(),
                });
            }
            None => return Err(SchemaError::not_found(error, format!("throws of {owner}"))),
        }
    }

    if message.one_way && (!message.response.is_null() || !message.errors.is_empty()) {
        return Err(SchemaError::validation(format!(
            "one-way message '{}' must return void and declare no errors",
            message.name
        )));
    }

    Ok(())
}

/// Checks that `namespace` is a dotted sequence of identifiers.
fn validate_namespace(namespace: &str, owner: &str) -> Result<(), SchemaError> {
    if namespace.split('.').all(is_identifier) {
        return Ok(());
    }
    Err(SchemaError::validation(format!(
        "invalid namespace '{}' on {}",
        namespace, owner
    )))
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
