//! Message (protocol trait) code generation.

use super::types::{TypeMapper, doc_lines};
use ironproto_schema::ir::{ProtocolIr, ResolvedMessage, to_pascal_case};

/// Generator for the protocol trait and its error enum.
pub struct MessageGenerator<'a> {
    ir: &'a ProtocolIr,
}

impl<'a> MessageGenerator<'a> {
    /// Creates a new message generator.
    #[must_use]
    pub fn new(ir: &'a ProtocolIr) -> Self {
        Self { ir }
    }

    /// Name of the generated protocol trait.
    #[must_use]
    pub fn trait_name(&self) -> String {
        format!("{}Protocol", to_pascal_case(&self.ir.name))
    }

    /// Name of the generated error enum.
    #[must_use]
    pub fn error_name(&self) -> String {
        format!("{}Error", to_pascal_case(&self.ir.name))
    }

    /// Generates the error enum and the protocol trait.
    ///
    /// Protocols without messages produce no output.
    #[must_use]
    pub fn generate(&self) -> String {
        if self.ir.messages.is_empty() {
            return String::new();
        }

        let mut mapper = TypeMapper::new(self.ir);
        let mut output = String::new();
        output.push_str(&self.generate_error_enum());

        let mut methods = String::new();
        for msg in &self.ir.messages {
            methods.push_str(&self.generate_method(&mut mapper, msg));
        }

        match self.ir.doc.as_deref() {
            Some(doc) => output.push_str(&doc_lines(Some(doc), "")),
            None => output.push_str(&format!("/// Messages of the `{}` protocol.\n", self.ir.name)),
        }
        output.push_str(&format!("pub trait {} {{\n", self.trait_name()));
        output.push_str(&methods);
        output.push_str("}\n\n");

        for union_def in mapper.take_unions() {
            output.push_str("#[derive(Debug, Clone, PartialEq)]\n");
            output.push_str(&format!("pub enum {} {{\n", union_def.name));
            for (variant, payload) in &union_def.variants {
                match payload {
                    Some(rust_type) => output.push_str(&format!("    {}({}),\n", variant, rust_type)),
                    None => output.push_str(&format!("    {},\n", variant)),
                }
            }
            output.push_str("}\n\n");
        }

        output
    }

    /// Generates the error enum covering every declared error type.
    fn generate_error_enum(&self) -> String {
        let mut declared: Vec<&str> = Vec::new();
        for msg in &self.ir.messages {
            for error in &msg.errors {
                match self.ir.rust_name(error) {
                    Some(rust_name) if !declared.contains(&rust_name) => declared.push(rust_name),
                    _ => {}
                }
            }
        }

        let name = self.error_name();
        let mut output = String::new();
        output.push_str(&format!("/// Errors a `{}` message may return.\n", self.ir.name));
        output.push_str("#[derive(Debug, Clone, PartialEq)]\n");
        output.push_str(&format!("pub enum {} {{\n", name));
        for error in &declared {
            output.push_str(&format!("    {}({}),\n", error, error));
        }
        output.push_str("    /// Failure not declared by the message.\n");
        output.push_str("    Undeclared(String),\n");
        output.push_str("}\n\n");

        output.push_str(&format!("impl std::fmt::Display for {} {{\n", name));
        output.push_str("    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {\n");
        output.push_str("        match self {\n");
        for error in &declared {
            output.push_str(&format!("            Self::{}(e) => write!(f, \"{{}}\", e),\n", error));
        }
        output.push_str("            Self::Undeclared(message) => f.write_str(message),\n");
        output.push_str("        }\n");
        output.push_str("    }\n");
        output.push_str("}\n\n");
        output.push_str(&format!("impl std::error::Error for {} {{}}\n\n", name));

        for error in &declared {
            output.push_str(&format!("impl From<{}> for {} {{\n", error, name));
            output.push_str(&format!("    fn from(error: {}) -> Self {{\n", error));
            output.push_str(&format!("        Self::{}(error)\n", error));
            output.push_str("    }\n");
            output.push_str("}\n\n");
        }

        output
    }

    /// Generates one trait method.
    fn generate_method(&self, mapper: &mut TypeMapper<'_>, msg: &ResolvedMessage) -> String {
        let mut output = String::new();
        let method_pascal = to_pascal_case(&msg.name);

        output.push_str(&doc_lines(msg.doc.as_deref(), "    "));
        let mut params = vec!["&self".to_string()];
        for param in &msg.request {
            let hint = format!("{}{}", method_pascal, to_pascal_case(&param.name));
            params.push(format!("{}: {}", param.ident, mapper.map(&param.schema, &hint)));
        }

        if msg.one_way {
            output.push_str(&format!("    fn {}({});\n", msg.method_name, params.join(", ")));
        } else {
            let response = mapper.map(&msg.response, &format!("{}Response", method_pascal));
            output.push_str(&format!(
                "    fn {}({}) -> Result<{}, {}>;\n",
                msg.method_name,
                params.join(", "),
                response,
                self.error_name()
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironproto_schema::parse_idl;

    fn create_test_ir() -> ProtocolIr {
        let protocol = parse_idl(
            r#"@namespace("org.example")
            protocol Greeter {
                record Greeting { string message; }
                error Refused { string reason; }
                error Busy { int retry_after; }

                /** Says hello. */
                Greeting hello(string name, union { null, long } delay) throws Refused, Busy;
                union { int, string } lookup(string key) throws Busy;
                void ping() oneway;
                void reset();
            }"#,
        )
        .expect("Failed to parse");
        ProtocolIr::from_protocol(&protocol)
    }

    #[test]
    fn test_names() {
        let ir = create_test_ir();
        let generator = MessageGenerator::new(&ir);
        assert_eq!(generator.trait_name(), "GreeterProtocol");
        assert_eq!(generator.error_name(), "GreeterError");
    }

    #[test]
    fn test_generate_trait_methods() {
        let ir = create_test_ir();
        let output = MessageGenerator::new(&ir).generate();

        assert!(output.contains("pub trait GreeterProtocol {"));
        assert!(output.contains(
            "    /// Says hello.\n    fn hello(&self, name: String, delay: Option<i64>) -> Result<Greeting, GreeterError>;\n"
        ));
        assert!(output.contains("    fn lookup(&self, key: String) -> Result<LookupResponse, GreeterError>;\n"));
        assert!(output.contains("    fn ping(&self);\n"));
        assert!(output.contains("    fn reset(&self) -> Result<(), GreeterError>;\n"));
        assert!(output.contains("pub enum LookupResponse {\n    Int(i32),\n    String(String),\n}"));
    }

    #[test]
    fn test_generate_error_enum() {
        let ir = create_test_ir();
        let output = MessageGenerator::new(&ir).generate();

        assert!(output.contains("pub enum GreeterError {\n    Refused(Refused),\n    Busy(Busy),\n"));
        assert_eq!(output.matches("    Busy(Busy),").count(), 1);
        assert!(output.contains("    Undeclared(String),\n"));
        assert!(output.contains("impl From<Refused> for GreeterError {"));
        assert!(output.contains("impl std::error::Error for GreeterError {}"));
    }

    #[test]
    fn test_no_messages_no_trait() {
        let protocol = parse_idl("protocol Empty { record R { int x; } }").expect("Failed to parse");
        let ir = ProtocolIr::from_protocol(&protocol);
        assert!(MessageGenerator::new(&ir).generate().is_empty());
    }
}
