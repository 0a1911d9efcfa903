//! Main code generator for a single protocol.

use crate::rust::{EnumGenerator, MessageGenerator, TypeGenerator};
use ironproto_schema::ir::ProtocolIr;

/// Generates one Rust source file for a protocol.
pub struct Generator<'a> {
    ir: &'a ProtocolIr,
}

impl<'a> Generator<'a> {
    /// Creates a new generator for the given protocol.
    #[must_use]
    pub fn new(ir: &'a ProtocolIr) -> Self {
        Self { ir }
    }

    /// Generates the complete Rust source.
    ///
    /// The output is deterministic: the same protocol always produces the
    /// same text.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.generate_header());
        output.push_str(&self.generate_constants());
        output.push_str(&EnumGenerator::new(self.ir).generate());
        output.push_str(&TypeGenerator::new(self.ir).generate());
        output.push_str(&MessageGenerator::new(self.ir).generate());

        while output.ends_with("\n\n") {
            output.pop();
        }
        output
    }

    fn generate_header(&self) -> String {
        let mut output = String::new();
        output.push_str("// Generated by ironproto. Do not edit.\n");
        match &self.ir.namespace {
            Some(ns) => output.push_str(&format!("// Protocol: {}.{}\n\n", ns, self.ir.name)),
            None => output.push_str(&format!("// Protocol: {}\n\n", self.ir.name)),
        }
        output
    }

    fn generate_constants(&self) -> String {
        let mut output = String::new();
        output.push_str("/// Protocol name.\n");
        output.push_str(&format!(
            "pub const PROTOCOL_NAME: &str = \"{}\";\n\n",
            self.ir.name
        ));
        if let Some(ns) = &self.ir.namespace {
            output.push_str("/// Protocol namespace.\n");
            output.push_str(&format!("pub const PROTOCOL_NAMESPACE: &str = \"{}\";\n\n", ns));
        }

        let hashes = "#".repeat(raw_string_hashes(&self.ir.canonical));
        output.push_str("/// Canonical schema text this file was generated from.\n");
        output.push_str(&format!(
            "pub const PROTOCOL: &str = r{hashes}\"{}\"{hashes};\n\n",
            self.ir.canonical.trim_end()
        ));
        output
    }
}

/// Returns the number of `#` needed to wrap `text` in a raw string literal.
fn raw_string_hashes(text: &str) -> usize {
    let mut longest = 0;
    let mut run: Option<usize> = None;
    for c in text.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => Some(n + 1),
            _ => None,
        };
        if let Some(n) = run {
            longest = longest.max(n);
        }
    }
    longest + 1
}
