//! Protocol type definitions.
//!
//! This module contains the data structures representing a protocol in its
//! canonical form: named types (records, errors, enums, fixed), field
//! schemas, and messages.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Custom properties attached to a protocol, type, field or message.
pub type Props = Map<String, Value>;

/// Complete protocol definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    /// Protocol name.
    pub name: String,
    /// Default namespace for the protocol's named types.
    pub namespace: Option<String>,
    /// Documentation string.
    pub doc: Option<String>,
    /// Custom properties.
    pub props: Props,
    /// Named type definitions, in declaration order.
    pub types: Vec<TypeDef>,
    /// Message definitions, in declaration order.
    pub messages: Vec<Message>,
    /// Full name to index lookup (built as types are added).
    type_map: HashMap<String, usize>,
}

impl Protocol {
    /// Creates a new empty protocol.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            doc: None,
            props: Props::new(),
            types: Vec::new(),
            messages: Vec::new(),
            type_map: HashMap::new(),
        }
    }

    /// Adds a type definition to the protocol.
    ///
    /// Returns `false` if a type with the same full name already exists; the
    /// definition is still appended so validation can report it.
    pub fn add_type(&mut self, type_def: TypeDef) -> bool {
        let full_name = type_def.full_name(self.namespace.as_deref());
        let index = self.types.len();
        self.types.push(type_def);
        if self.type_map.contains_key(&full_name) {
            return false;
        }
        self.type_map.insert(full_name, index);
        true
    }

    /// Looks up a type by reference.
    ///
    /// A dotted reference is treated as a full name. A simple name is tried
    /// in the protocol namespace first, then as-is.
    #[must_use]
    pub fn get_type(&self, reference: &str) -> Option<&TypeDef> {
        self.resolve_index(reference).map(|idx| &self.types[idx])
    }

    /// Returns true if the reference resolves to a named type.
    #[must_use]
    pub fn has_type(&self, reference: &str) -> bool {
        self.resolve_index(reference).is_some()
    }

    /// Returns the full name of a type definition within this protocol.
    #[must_use]
    pub fn full_name_of(&self, type_def: &TypeDef) -> String {
        type_def.full_name(self.namespace.as_deref())
    }

    /// Looks up a message by name.
    #[must_use]
    pub fn get_message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// Rebuilds the type lookup map from the types vector.
    pub fn build_type_map(&mut self) {
        self.type_map.clear();
        for (idx, type_def) in self.types.iter().enumerate() {
            let full_name = type_def.full_name(self.namespace.as_deref());
            self.type_map.entry(full_name).or_insert(idx);
        }
    }

    fn resolve_index(&self, reference: &str) -> Option<usize> {
        if !reference.contains('.') {
            if let Some(ns) = self.namespace.as_deref() {
                if let Some(&idx) = self.type_map.get(&format!("{ns}.{reference}")) {
                    return Some(idx);
                }
            }
        }
        self.type_map.get(reference).copied()
    }
}

/// Named type definition variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// Record (or error) type definition.
    Record(RecordDef),
    /// Enum type definition.
    Enum(EnumDef),
    /// Fixed-size byte array definition.
    Fixed(FixedDef),
}

impl TypeDef {
    /// Returns the simple name of the type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Record(r) => &r.name,
            Self::Enum(e) => &e.name,
            Self::Fixed(f) => &f.name,
        }
    }

    /// Returns the explicit namespace of the type, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Record(r) => r.namespace.as_deref(),
            Self::Enum(e) => e.namespace.as_deref(),
            Self::Fixed(f) => f.namespace.as_deref(),
        }
    }

    /// Returns the full name, falling back to `default_namespace`.
    #[must_use]
    pub fn full_name(&self, default_namespace: Option<&str>) -> String {
        match self.namespace().or(default_namespace) {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name()),
            _ => self.name().to_string(),
        }
    }

    /// Returns the documentation string.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        match self {
            Self::Record(r) => r.doc.as_deref(),
            Self::Enum(e) => e.doc.as_deref(),
            Self::Fixed(f) => f.doc.as_deref(),
        }
    }

    /// Returns the custom properties.
    #[must_use]
    pub fn props(&self) -> &Props {
        match self {
            Self::Record(r) => &r.props,
            Self::Enum(e) => &e.props,
            Self::Fixed(f) => &f.props,
        }
    }

    /// Returns the canonical kind keyword (`record`, `error`, `enum`, `fixed`).
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Record(r) if r.is_error => "error",
            Self::Record(_) => "record",
            Self::Enum(_) => "enum",
            Self::Fixed(_) => "fixed",
        }
    }

    /// Returns true if this is a record (not an error).
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(r) if !r.is_error)
    }

    /// Returns true if this is an error type.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Record(r) if r.is_error)
    }

    /// Returns true if this is an enum type.
    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    /// Returns true if this is a fixed type.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

/// Record or error type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDef {
    /// Type name.
    pub name: String,
    /// Explicit namespace.
    pub namespace: Option<String>,
    /// Documentation string.
    pub doc: Option<String>,
    /// Custom properties.
    pub props: Props,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// Whether this record is declared as an error.
    pub is_error: bool,
}

impl RecordDef {
    /// Creates a new record definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            props: Props::new(),
            fields: Vec::new(),
            is_error: false,
        }
    }

    /// Creates a new error definition.
    #[must_use]
    pub fn error(name: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(name)
        }
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Enum type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// Type name.
    pub name: String,
    /// Explicit namespace.
    pub namespace: Option<String>,
    /// Documentation string.
    pub doc: Option<String>,
    /// Custom properties.
    pub props: Props,
    /// Enum symbols in declaration order.
    pub symbols: Vec<String>,
}

impl EnumDef {
    /// Creates a new enum definition.
    #[must_use]
    pub fn new(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            props: Props::new(),
            symbols,
        }
    }
}

/// Fixed-size byte array definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedDef {
    /// Type name.
    pub name: String,
    /// Explicit namespace.
    pub namespace: Option<String>,
    /// Documentation string.
    pub doc: Option<String>,
    /// Custom properties.
    pub props: Props,
    /// Size in bytes.
    pub size: usize,
}

impl FixedDef {
    /// Creates a new fixed definition.
    #[must_use]
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            doc: None,
            props: Props::new(),
            size,
        }
    }
}

/// Record field or message parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field schema.
    pub schema: Schema,
    /// Default value, as JSON.
    pub default: Option<Value>,
    /// Documentation string.
    pub doc: Option<String>,
    /// Custom properties.
    pub props: Props,
}

impl Field {
    /// Creates a new field with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            default: None,
            doc: None,
            props: Props::new(),
        }
    }
}

/// Field schema: a primitive, a container, a union, or a named reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Schema {
    /// No value.
    Null,
    /// Boolean.
    Boolean,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Byte sequence.
    Bytes,
    /// UTF-8 string.
    String,
    /// Array of items.
    Array(Box<Schema>),
    /// Map from string keys to values.
    Map(Box<Schema>),
    /// Union of branches.
    Union(Vec<Schema>),
    /// Reference to a named type.
    Named(String),
}

impl Schema {
    /// Parses a primitive type name.
    #[must_use]
    pub fn primitive(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "bytes" => Some(Self::Bytes),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// Returns the primitive type name, or `None` for complex schemas.
    #[must_use]
    pub const fn primitive_name(&self) -> Option<&'static str> {
        match self {
            Self::Null => Some("null"),
            Self::Boolean => Some("boolean"),
            Self::Int => Some("int"),
            Self::Long => Some("long"),
            Self::Float => Some("float"),
            Self::Double => Some("double"),
            Self::Bytes => Some("bytes"),
            Self::String => Some("string"),
            _ => None,
        }
    }

    /// Returns true for the null schema.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// For a two-branch union with one null branch, returns the other branch.
    #[must_use]
    pub fn optional_inner(&self) -> Option<&Schema> {
        match self {
            Self::Union(branches) if branches.len() == 2 => {
                match (&branches[0], &branches[1]) {
                    (Self::Null, other) | (other, Self::Null) if !other.is_null() => Some(other),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Calls `f` with every named reference in this schema.
    pub fn visit_references<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Self::Named(name) => f(name),
            Self::Array(items) | Self::Map(items) => items.visit_references(f),
            Self::Union(branches) => {
                for branch in branches {
                    branch.visit_references(f);
                }
            }
            _ => {}
        }
    }
}

/// Protocol message (remote call) definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Message name.
    pub name: String,
    /// Documentation string.
    pub doc: Option<String>,
    /// Custom properties.
    pub props: Props,
    /// Request parameters.
    pub request: Vec<Field>,
    /// Response schema (`Null` for `void`).
    pub response: Schema,
    /// Declared error type references.
    pub errors: Vec<String>,
    /// Whether the message expects no response.
    pub one_way: bool,
}

impl Message {
    /// Creates a new two-way message with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, response: Schema) -> Self {
        Self {
            name: name.into(),
            doc: None,
            props: Props::new(),
            request: Vec::new(),
            response,
            errors: Vec::new(),
            one_way: false,
        }
    }
}
