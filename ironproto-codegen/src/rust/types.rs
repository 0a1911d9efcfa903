//! Record, fixed and union code generation.

use ironproto_schema::Schema;
use ironproto_schema::ir::{ProtocolIr, ResolvedField, TypeKind, to_pascal_case};

/// Union enum collected while mapping field types.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDef {
    /// Rust enum name.
    pub name: String,
    /// Variant name and payload type (`None` for the null branch).
    pub variants: Vec<(String, Option<String>)>,
}

/// Maps schemas to Rust type expressions.
///
/// Unions that are not a plain `[null, T]` option need a dedicated enum;
/// the mapper names them after the field and collects their definitions.
pub struct TypeMapper<'a> {
    ir: &'a ProtocolIr,
    unions: Vec<UnionDef>,
}

impl<'a> TypeMapper<'a> {
    /// Creates a new type mapper.
    #[must_use]
    pub fn new(ir: &'a ProtocolIr) -> Self {
        Self {
            ir,
            unions: Vec::new(),
        }
    }

    /// Returns the Rust type for `schema`; `hint` names any union enum needed.
    pub fn map(&mut self, schema: &Schema, hint: &str) -> String {
        match schema {
            Schema::Null => "()".to_string(),
            Schema::Boolean => "bool".to_string(),
            Schema::Int => "i32".to_string(),
            Schema::Long => "i64".to_string(),
            Schema::Float => "f32".to_string(),
            Schema::Double => "f64".to_string(),
            Schema::Bytes => "Vec<u8>".to_string(),
            Schema::String => "String".to_string(),
            Schema::Array(items) => format!("Vec<{}>", self.map(items, &format!("{hint}Item"))),
            Schema::Map(values) => format!(
                "std::collections::BTreeMap<String, {}>",
                self.map(values, &format!("{hint}Value"))
            ),
            Schema::Named(name) => self.named(name),
            Schema::Union(branches) => {
                if let Some(inner) = schema.optional_inner() {
                    return format!("Option<{}>", self.map(inner, hint));
                }
                let variants = branches
                    .iter()
                    .map(|branch| {
                        let variant = self.variant_name(branch);
                        let payload = if branch.is_null() {
                            None
                        } else {
                            Some(self.map(branch, &format!("{hint}{variant}")))
                        };
                        (variant, payload)
                    })
                    .collect();
                self.unions.push(UnionDef {
                    name: hint.to_string(),
                    variants,
                });
                hint.to_string()
            }
        }
    }

    /// Returns the Rust type for a record field, boxing recursive references.
    pub fn field_type(&mut self, owner_full_name: &str, owner_rust: &str, field: &ResolvedField) -> String {
        let hint = format!("{}{}", owner_rust, to_pascal_case(&field.name));
        if self.ir.needs_box(owner_full_name, &field.schema) {
            if let Some(inner) = field.schema.optional_inner() {
                return format!("Option<Box<{}>>", self.map(inner, &hint));
            }
            return format!("Box<{}>", self.map(&field.schema, &hint));
        }
        self.map(&field.schema, &hint)
    }

    /// Takes the union enums collected so far.
    pub fn take_unions(&mut self) -> Vec<UnionDef> {
        std::mem::take(&mut self.unions)
    }

    fn named(&self, reference: &str) -> String {
        self.ir
            .rust_name(reference)
            .map(str::to_string)
            .unwrap_or_else(|| to_pascal_case(reference.rsplit('.').next().unwrap_or(reference)))
    }

    fn variant_name(&self, branch: &Schema) -> String {
        match branch {
            Schema::Named(name) => self.named(name),
            Schema::Array(_) => "Array".to_string(),
            Schema::Map(_) => "Map".to_string(),
            Schema::Union(_) => "Union".to_string(),
            other => to_pascal_case(other.primitive_name().unwrap_or("value")),
        }
    }
}

/// Generator for record, error and fixed definitions.
pub struct TypeGenerator<'a> {
    ir: &'a ProtocolIr,
}

impl<'a> TypeGenerator<'a> {
    /// Creates a new type generator.
    #[must_use]
    pub fn new(ir: &'a ProtocolIr) -> Self {
        Self { ir }
    }

    /// Generates all record, error and fixed definitions, followed by the
    /// union enums their fields need.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();
        let mut mapper = TypeMapper::new(self.ir);

        for resolved in &self.ir.types {
            match &resolved.kind {
                TypeKind::Fixed { size } => {
                    output.push_str(&doc_lines(resolved.doc.as_deref(), ""));
                    output.push_str(&self.generate_fixed(&resolved.rust_name, *size));
                }
                TypeKind::Record { fields, is_error } => {
                    output.push_str(&doc_lines(resolved.doc.as_deref(), ""));
                    output.push_str(&self.generate_record(
                        &mut mapper,
                        &resolved.full_name,
                        &resolved.rust_name,
                        fields,
                        *is_error,
                    ));
                }
                TypeKind::Enum { .. } => {}
            }
        }

        for union_def in mapper.take_unions() {
            output.push_str(&generate_union(&union_def));
        }

        output
    }

    /// Generates a fixed-size byte array newtype.
    fn generate_fixed(&self, name: &str, size: usize) -> String {
        let mut output = String::new();
        output.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
        output.push_str(&format!("pub struct {}(pub [u8; {}]);\n\n", name, size));
        output.push_str(&format!("impl {} {{\n", name));
        output.push_str("    /// Size in bytes.\n");
        output.push_str(&format!("    pub const SIZE: usize = {};\n", size));
        output.push_str("}\n\n");
        output
    }

    /// Generates a record (or error) struct.
    fn generate_record(
        &self,
        mapper: &mut TypeMapper<'_>,
        full_name: &str,
        name: &str,
        fields: &[ResolvedField],
        is_error: bool,
    ) -> String {
        let mut output = String::new();
        output.push_str("#[derive(Debug, Clone, PartialEq)]\n");
        if fields.is_empty() {
            output.push_str(&format!("pub struct {} {{}}\n\n", name));
        } else {
            output.push_str(&format!("pub struct {} {{\n", name));
            for field in fields {
                output.push_str(&doc_lines(field.doc.as_deref(), "    "));
                let rust_type = mapper.field_type(full_name, name, field);
                output.push_str(&format!("    pub {}: {},\n", field.ident, rust_type));
            }
            output.push_str("}\n\n");
        }

        if is_error {
            output.push_str(&format!("impl std::fmt::Display for {} {{\n", name));
            output.push_str("    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {\n");
            output.push_str(&format!("        write!(f, \"{}: {{:?}}\", self)\n", name));
            output.push_str("    }\n");
            output.push_str("}\n\n");
            output.push_str(&format!("impl std::error::Error for {} {{}}\n\n", name));
        }

        output
    }
}

/// Generates a union enum.
fn generate_union(union_def: &UnionDef) -> String {
    let mut output = String::new();
    output.push_str(&format!("/// Union value for `{}`.\n", union_def.name));
    output.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    output.push_str(&format!("pub enum {} {{\n", union_def.name));
    for (variant, payload) in &union_def.variants {
        match payload {
            Some(rust_type) => output.push_str(&format!("    {}({}),\n", variant, rust_type)),
            None => output.push_str(&format!("    {},\n", variant)),
        }
    }
    output.push_str("}\n\n");
    output
}

/// Renders a doc comment with the given indentation.
pub(crate) fn doc_lines(doc: Option<&str>, indent: &str) -> String {
    let Some(doc) = doc else {
        return String::new();
    };
    doc.lines()
        .map(|line| {
            if line.trim().is_empty() {
                format!("{indent}///\n")
            } else {
                format!("{indent}/// {}\n", line.trim_end())
            }
        })
        .collect()
}
