//! Enum code generation.

use super::types::doc_lines;
use ironproto_schema::ir::{ProtocolIr, TypeKind, to_variant_name};

/// Generator for enum definitions.
pub struct EnumGenerator<'a> {
    ir: &'a ProtocolIr,
}

impl<'a> EnumGenerator<'a> {
    /// Creates a new enum generator.
    #[must_use]
    pub fn new(ir: &'a ProtocolIr) -> Self {
        Self { ir }
    }

    /// Generates all enum definitions.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        for resolved_type in &self.ir.types {
            if let TypeKind::Enum { symbols } = &resolved_type.kind {
                output.push_str(&doc_lines(resolved_type.doc.as_deref(), ""));
                output.push_str(&self.generate_enum(&resolved_type.rust_name, symbols));
            }
        }

        output
    }

    /// Generates an enum definition with symbol conversions.
    fn generate_enum(&self, name: &str, symbols: &[String]) -> String {
        let mut output = String::new();

        output.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
        output.push_str(&format!("pub enum {} {{\n", name));
        for symbol in symbols {
            output.push_str(&format!("    {},\n", to_variant_name(symbol)));
        }
        output.push_str("}\n\n");

        output.push_str(&format!("impl {} {{\n", name));

        output.push_str("    /// Symbols in declaration order.\n");
        output.push_str("    pub const SYMBOLS: &'static [&'static str] = &[");
        let quoted: Vec<String> = symbols.iter().map(|s| format!("\"{}\"", s)).collect();
        output.push_str(&quoted.join(", "));
        output.push_str("];\n\n");

        output.push_str("    /// Returns the symbol as declared in the protocol.\n");
        output.push_str("    #[must_use]\n");
        output.push_str("    pub const fn as_str(&self) -> &'static str {\n");
        output.push_str("        match *self {\n");
        for symbol in symbols {
            output.push_str(&format!(
                "            Self::{} => \"{}\",\n",
                to_variant_name(symbol),
                symbol
            ));
        }
        output.push_str("        }\n");
        output.push_str("    }\n\n");

        output.push_str("    /// Looks up a value by its declared symbol.\n");
        output.push_str("    #[must_use]\n");
        output.push_str("    pub fn from_symbol(symbol: &str) -> Option<Self> {\n");
        output.push_str("        match symbol {\n");
        for symbol in symbols {
            output.push_str(&format!(
                "            \"{}\" => Some(Self::{}),\n",
                symbol,
                to_variant_name(symbol)
            ));
        }
        output.push_str("            _ => None,\n");
        output.push_str("        }\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");

        output.push_str(&format!("impl std::fmt::Display for {} {{\n", name));
        output.push_str("    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {\n");
        output.push_str("        f.write_str(self.as_str())\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironproto_schema::parse_idl;

    fn create_test_ir() -> ProtocolIr {
        let protocol = parse_idl(
            r#"protocol Traffic {
                /** Light colour. */
                enum Light { RED, AMBER, GREEN }
                enum Mode { manual, auto_cycle }
                record Unused { int x; }
            }"#,
        )
        .expect("Failed to parse");
        ProtocolIr::from_protocol(&protocol)
    }

    #[test]
    fn test_enum_generator_new() {
        let ir = create_test_ir();
        let generator = EnumGenerator::new(&ir);
        let output = generator.generate();
        assert!(!output.contains("Unused"));
    }

    #[test]
    fn test_generate_enum_variants() {
        let ir = create_test_ir();
        let output = EnumGenerator::new(&ir).generate();

        assert!(output.contains("/// Light colour.\n#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\npub enum Light {"));
        assert!(output.contains("    Red,\n    Amber,\n    Green,\n"));
        assert!(output.contains("    Manual,\n    AutoCycle,\n"));
    }

    #[test]
    fn test_generate_enum_conversions() {
        let ir = create_test_ir();
        let output = EnumGenerator::new(&ir).generate();

        assert!(output.contains("pub const SYMBOLS: &'static [&'static str] = &[\"RED\", \"AMBER\", \"GREEN\"];"));
        assert!(output.contains("Self::Amber => \"AMBER\","));
        assert!(output.contains("\"auto_cycle\" => Some(Self::AutoCycle),"));
        assert!(output.contains("impl std::fmt::Display for Mode {"));
    }
}
