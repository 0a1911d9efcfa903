//! Intermediate representation for code generation.
//!
//! This module provides a resolved representation of the protocol that is
//! easier to use for code generation: named references are mapped to their
//! definitions and every identifier is precomputed in its Rust spelling.

use crate::types::{Field, Protocol, Schema, TypeDef};
use std::collections::{HashMap, HashSet};

/// Intermediate representation of a protocol for code generation.
#[derive(Debug, Clone)]
pub struct ProtocolIr {
    /// Protocol name.
    pub name: String,
    /// Protocol namespace.
    pub namespace: Option<String>,
    /// Documentation string.
    pub doc: Option<String>,
    /// Resolved types in declaration order.
    pub types: Vec<ResolvedType>,
    /// Resolved messages in declaration order.
    pub messages: Vec<ResolvedMessage>,
    /// Canonical text of the source protocol.
    pub canonical: String,
    /// Full name to index in `types`.
    index: HashMap<String, usize>,
    /// Simple-name and full-name references, resolved to full names.
    references: HashMap<String, String>,
}

impl ProtocolIr {
    /// Creates an intermediate representation from a validated protocol.
    #[must_use]
    pub fn from_protocol(protocol: &Protocol) -> Self {
        let mut ir = Self {
            name: protocol.name.clone(),
            namespace: protocol.namespace.clone(),
            doc: protocol.doc.clone(),
            types: Vec::new(),
            messages: Vec::new(),
            canonical: protocol.to_canonical_string(),
            index: HashMap::new(),
            references: HashMap::new(),
        };

        for type_def in &protocol.types {
            let resolved = ResolvedType::from_type_def(protocol, type_def);
            ir.index.insert(resolved.full_name.clone(), ir.types.len());
            ir.types.push(resolved);
        }

        for type_def in &protocol.types {
            let full_name = protocol.full_name_of(type_def);
            ir.references
                .entry(type_def.name().to_string())
                .or_insert_with(|| full_name.clone());
            ir.references.insert(full_name.clone(), full_name);
        }
        // References in the protocol namespace win over bare-name collisions.
        for type_def in &protocol.types {
            if type_def.namespace().is_none() {
                ir.references.insert(
                    type_def.name().to_string(),
                    protocol.full_name_of(type_def),
                );
            }
        }

        for msg in &protocol.messages {
            ir.messages.push(ResolvedMessage {
                name: msg.name.clone(),
                method_name: to_field_ident(&msg.name),
                doc: msg.doc.clone(),
                request: msg.request.iter().map(ResolvedField::from_field).collect(),
                response: msg.response.clone(),
                errors: msg
                    .errors
                    .iter()
                    .map(|e| {
                        protocol
                            .get_type(e)
                            .map(|t| protocol.full_name_of(t))
                            .unwrap_or_else(|| e.clone())
                    })
                    .collect(),
                one_way: msg.one_way,
            });
        }

        ir
    }

    /// Resolves a named reference to its type.
    #[must_use]
    pub fn get_type(&self, reference: &str) -> Option<&ResolvedType> {
        self.references
            .get(reference)
            .and_then(|full| self.index.get(full))
            .map(|&idx| &self.types[idx])
    }

    /// Returns the Rust type name for a named reference.
    #[must_use]
    pub fn rust_name(&self, reference: &str) -> Option<&str> {
        self.get_type(reference).map(|t| t.rust_name.as_str())
    }

    /// Returns the Rust module file stem for this protocol.
    #[must_use]
    pub fn module_name(&self) -> String {
        to_snake_case(&self.name)
    }

    /// Returns true if a field of `schema` inside record `owner` needs a
    /// `Box` to keep the generated struct finitely sized.
    ///
    /// Only direct and optional record references count; arrays and maps
    /// already allocate.
    #[must_use]
    pub fn needs_box(&self, owner: &str, schema: &Schema) -> bool {
        let target = match schema {
            Schema::Named(name) => name,
            other => match other.optional_inner() {
                Some(Schema::Named(name)) => name,
                _ => return false,
            },
        };
        let Some(target) = self.get_type(target) else {
            return false;
        };
        let mut visited = HashSet::new();
        self.reaches(&target.full_name, owner, &mut visited)
    }

    fn reaches(&self, from: &str, goal: &str, visited: &mut HashSet<String>) -> bool {
        if from == goal {
            return true;
        }
        if !visited.insert(from.to_string()) {
            return false;
        }
        let Some(&idx) = self.index.get(from) else {
            return false;
        };
        let TypeKind::Record { fields, .. } = &self.types[idx].kind else {
            return false;
        };
        fields.iter().any(|field| {
            let next = match &field.schema {
                Schema::Named(name) => Some(name),
                other => match other.optional_inner() {
                    Some(Schema::Named(name)) => Some(name),
                    _ => None,
                },
            };
            next.and_then(|n| self.get_type(n))
                .is_some_and(|t| self.reaches(&t.full_name, goal, visited))
        })
    }
}

/// Resolved named type information.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    /// Simple name.
    pub name: String,
    /// Fully qualified name.
    pub full_name: String,
    /// Rust type name.
    pub rust_name: String,
    /// Documentation string.
    pub doc: Option<String>,
    /// Type kind.
    pub kind: TypeKind,
}

impl ResolvedType {
    /// Creates a resolved type from a type definition.
    #[must_use]
    pub fn from_type_def(protocol: &Protocol, type_def: &TypeDef) -> Self {
        let kind = match type_def {
            TypeDef::Record(r) => TypeKind::Record {
                fields: r.fields.iter().map(ResolvedField::from_field).collect(),
                is_error: r.is_error,
            },
            TypeDef::Enum(e) => TypeKind::Enum {
                symbols: e.symbols.clone(),
            },
            TypeDef::Fixed(f) => TypeKind::Fixed { size: f.size },
        };

        Self {
            name: type_def.name().to_string(),
            full_name: protocol.full_name_of(type_def),
            rust_name: to_pascal_case(type_def.name()),
            doc: type_def.doc().map(str::to_string),
            kind,
        }
    }
}

/// Type kind classification.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Record or error type.
    Record {
        /// Resolved fields.
        fields: Vec<ResolvedField>,
        /// Whether the record is an error.
        is_error: bool,
    },
    /// Enum type.
    Enum {
        /// Symbols in declaration order.
        symbols: Vec<String>,
    },
    /// Fixed-size byte array.
    Fixed {
        /// Size in bytes.
        size: usize,
    },
}

/// Resolved field (record field or message parameter).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// Field name as declared.
    pub name: String,
    /// Rust identifier for the field.
    pub ident: String,
    /// Field schema.
    pub schema: Schema,
    /// Documentation string.
    pub doc: Option<String>,
}

impl ResolvedField {
    /// Creates a resolved field from a field definition.
    #[must_use]
    pub fn from_field(field: &Field) -> Self {
        Self {
            name: field.name.clone(),
            ident: to_field_ident(&field.name),
            schema: field.schema.clone(),
            doc: field.doc.clone(),
        }
    }
}

/// Resolved message information.
#[derive(Debug, Clone)]
pub struct ResolvedMessage {
    /// Message name as declared.
    pub name: String,
    /// Rust method name.
    pub method_name: String,
    /// Documentation string.
    pub doc: Option<String>,
    /// Request parameters.
    pub request: Vec<ResolvedField>,
    /// Response schema.
    pub response: Schema,
    /// Full names of declared error types.
    pub errors: Vec<String>,
    /// Whether the message is one-way.
    pub one_way: bool,
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Converts a name to a snake_case Rust identifier, escaping keywords.
#[must_use]
pub fn to_field_ident(name: &str) -> String {
    let snake = to_snake_case(name);
    if matches!(snake.as_str(), "self" | "super" | "crate" | "Self") {
        format!("{snake}_")
    } else if RUST_KEYWORDS.contains(&snake.as_str()) {
        format!("r#{snake}")
    } else {
        snake
    }
}

/// Converts a camelCase string to snake_case.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            result.push(c);
        }
    }
    result
}

/// Converts a string to PascalCase.
#[must_use]
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Converts an enum symbol (usually SCREAMING_CASE) to a PascalCase variant.
#[must_use]
pub fn to_variant_name(symbol: &str) -> String {
    if symbol.chars().any(|c| c.is_ascii_lowercase()) {
        to_pascal_case(symbol)
    } else {
        to_pascal_case(&symbol.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::parse_idl;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("clOrdId"), "cl_ord_id");
        assert_eq!(to_snake_case("symbol"), "symbol");
        assert_eq!(to_snake_case("HTTPServer"), "httpserver");
        assert_eq!(to_snake_case("MailService"), "mail_service");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("order_id"), "OrderId");
        assert_eq!(to_pascal_case("Envelope"), "Envelope");
        assert_eq!(to_pascal_case("mail-box"), "MailBox");
    }

    #[test]
    fn test_to_variant_name() {
        assert_eq!(to_variant_name("HIGH_PRIORITY"), "HighPriority");
        assert_eq!(to_variant_name("Low"), "Low");
    }

    #[test]
    fn test_to_field_ident_escapes_keywords() {
        assert_eq!(to_field_ident("type"), "r#type");
        assert_eq!(to_field_ident("self"), "self_");
        assert_eq!(to_field_ident("userName"), "user_name");
    }

    #[test]
    fn test_ir_from_protocol() {
        let protocol = parse_idl(
            r#"@namespace("org.acme")
            protocol Inventory {
                enum Unit { PIECE, KILOGRAM }
                record stock_item { string sku; Unit unit; }
                error OutOfStock { string sku; }
                stock_item lookup(string sku) throws OutOfStock;
            }"#,
        )
        .expect("Failed to parse");
        let ir = ProtocolIr::from_protocol(&protocol);

        assert_eq!(ir.module_name(), "inventory");
        assert_eq!(ir.types.len(), 3);
        assert_eq!(ir.rust_name("stock_item"), Some("StockItem"));
        assert_eq!(ir.rust_name("org.acme.Unit"), Some("Unit"));
        assert_eq!(ir.messages[0].errors, vec!["org.acme.OutOfStock".to_string()]);
        assert!(ir.canonical.contains("\"protocol\": \"Inventory\""));
    }

    #[test]
    fn test_needs_box_for_recursive_records() {
        let protocol = parse_idl(
            r#"protocol Tree {
                record Node { string label; union { null, Node } next; array<Node> children; }
                record Leaf { string label; }
                record Holder { Leaf leaf; }
            }"#,
        )
        .expect("Failed to parse");
        let ir = ProtocolIr::from_protocol(&protocol);

        let next = Schema::Union(vec![Schema::Null, Schema::Named("Node".into())]);
        assert!(ir.needs_box("Node", &next));
        assert!(!ir.needs_box("Node", &Schema::Array(Box::new(Schema::Named("Node".into())))));
        assert!(!ir.needs_box("Holder", &Schema::Named("Leaf".into())));
    }
}
