//! Interface-definition language (IDL) lowering.
//!
//! The IDL is the human-authored form of a protocol:
//!
//! ```text
//! /** Greets people. */
//! @namespace("org.example.hello")
//! protocol Greeter {
//!     enum Mood { HAPPY, GRUMPY }
//!     fixed Token(8);
//!     record Greeting {
//!         string message;
//!         union { null, Mood } mood = null;
//!         array<string> tags = [];
//!     }
//!     error Refused { string reason; }
//!
//!     Greeting hello(string name) throws Refused;
//!     void ping() oneway;
//! }
//! ```
//!
//! Lowering produces a [`Protocol`], whose canonical text form is what the
//! code generator consumes.

pub mod lexer;
pub mod parser;

use crate::error::ParseError;
use crate::types::Protocol;
use crate::validation::validate_protocol;

pub use lexer::{Token, TokenKind, tokenize};
pub use parser::Parser;

/// Parses interface-definition text into a validated protocol.
///
/// # Arguments
/// * `source` - IDL source text
///
/// # Errors
/// Returns `ParseError` with a line and column for syntax errors, or
/// `ParseError::Schema` if the declarations are inconsistent.
pub fn parse_idl(source: &str) -> Result<Protocol, ParseError> {
    let tokens = tokenize(source)?;
    let protocol = Parser::new(tokens).parse_compilation_unit()?;
    validate_protocol(&protocol)?;
    tracing::debug!(
        protocol = %protocol.name,
        types = protocol.types.len(),
        messages = protocol.messages.len(),
        "lowered interface definition"
    );
    Ok(protocol)
}

/// Reads and parses an IDL file.
///
/// # Errors
/// Returns `ParseError::Io` if the file cannot be read, otherwise as
/// [`parse_idl`].
pub fn parse_idl_file(path: &std::path::Path) -> Result<Protocol, ParseError> {
    let source = std::fs::read_to_string(path)?;
    parse_idl(&source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Schema, TypeDef};
    use serde_json::{Value, json};

    const GREETER: &str = r#"
/** Greets people. */
@namespace("org.example.hello")
@version("1.0")
protocol Greeter {
    /** How the greeter feels. */
    enum Mood { HAPPY, GRUMPY, }

    fixed Token(8);

    @namespace("org.example.shared")
    record Greeting {
        /** The text. */
        string message;
        union { null, Mood } mood = null;
        array<string> tags = [];
        map<long> counters;
        @order("ignore") int a = 1, b = 2;
        org.example.shared.Greeting `record`;
    }

    error Refused { string reason; }

    /** Says hello. */
    org.example.shared.Greeting hello(string name, Token token) throws Refused;
    void ping() oneway;
}
"#;

    #[test]
    fn test_parse_protocol_header() {
        let protocol = parse_idl(GREETER).expect("Failed to parse");
        assert_eq!(protocol.name, "Greeter");
        assert_eq!(protocol.namespace.as_deref(), Some("org.example.hello"));
        assert_eq!(protocol.doc.as_deref(), Some("Greets people."));
        assert_eq!(protocol.props.get("version"), Some(&json!("1.0")));
    }

    #[test]
    fn test_parse_types() {
        let protocol = parse_idl(GREETER).expect("Failed to parse");
        assert_eq!(protocol.types.len(), 4);

        let TypeDef::Enum(mood) = protocol.get_type("Mood").unwrap() else {
            panic!("expected enum");
        };
        assert_eq!(mood.symbols, vec!["HAPPY", "GRUMPY"]);
        assert_eq!(mood.doc.as_deref(), Some("How the greeter feels."));

        let TypeDef::Fixed(token) = protocol.get_type("Token").unwrap() else {
            panic!("expected fixed");
        };
        assert_eq!(token.size, 8);

        assert!(protocol.get_type("Refused").unwrap().is_error());
    }

    #[test]
    fn test_parse_record_fields() {
        let protocol = parse_idl(GREETER).expect("Failed to parse");
        let TypeDef::Record(greeting) = protocol.get_type("org.example.shared.Greeting").unwrap()
        else {
            panic!("expected record");
        };
        assert_eq!(greeting.namespace.as_deref(), Some("org.example.shared"));

        let names: Vec<_> = greeting.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["message", "mood", "tags", "counters", "a", "b", "record"]
        );

        let message = greeting.get_field("message").unwrap();
        assert_eq!(message.doc.as_deref(), Some("The text."));

        let mood = greeting.get_field("mood").unwrap();
        assert_eq!(
            mood.schema,
            Schema::Union(vec![Schema::Null, Schema::Named("Mood".into())])
        );
        assert_eq!(mood.default, Some(Value::Null));

        assert_eq!(greeting.get_field("tags").unwrap().default, Some(json!([])));
        assert_eq!(
            greeting.get_field("counters").unwrap().schema,
            Schema::Map(Box::new(Schema::Long))
        );

        let b = greeting.get_field("b").unwrap();
        assert_eq!(b.default, Some(json!(2)));
        assert_eq!(b.props.get("order"), Some(&json!("ignore")));
    }

    #[test]
    fn test_parse_messages() {
        let protocol = parse_idl(GREETER).expect("Failed to parse");

        let hello = protocol.get_message("hello").unwrap();
        assert_eq!(hello.doc.as_deref(), Some("Says hello."));
        assert_eq!(hello.request.len(), 2);
        assert_eq!(hello.errors, vec!["Refused".to_string()]);
        assert!(!hello.one_way);

        let ping = protocol.get_message("ping").unwrap();
        assert!(ping.one_way);
        assert!(ping.response.is_null());
        assert!(ping.request.is_empty());
    }

    #[test]
    fn test_lowered_protocol_survives_canonical_round_trip() {
        let protocol = parse_idl(GREETER).expect("Failed to parse");
        let text = protocol.to_canonical_string();
        let reparsed = crate::parser::parse_protocol(&text).expect("Failed to reparse");
        assert_eq!(protocol, reparsed);
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse_idl("protocol P {\n  record R {\n    string name\n  }\n}").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        assert_eq!(err.position(), Some((4, 3)));
        assert!(err.to_string().contains("expected ';'"));
    }

    #[test]
    fn test_unexpected_eof() {
        let err = parse_idl("protocol P { record R {").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_missing_protocol_keyword() {
        let err = parse_idl("record R {}").unwrap_err();
        assert!(err.to_string().contains("'protocol'"));
    }

    #[test]
    fn test_void_field_rejected() {
        let err = parse_idl("protocol P { record R { void x; } }").unwrap_err();
        assert!(err.to_string().contains("void"));
    }

    #[test]
    fn test_unknown_reference_fails_validation() {
        let err = parse_idl("protocol P { record R { Missing x; } }").unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }

    #[test]
    fn test_namespace_annotation_must_be_string() {
        let err = parse_idl("@namespace(42) protocol P {}").unwrap_err();
        assert!(err.to_string().contains("@namespace expects a string"));
    }

    #[test]
    fn test_reserved_annotation_rejected() {
        let err = parse_idl("protocol P { record R {\n  @type(\"string\") int x; } }").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        assert_eq!(err.position(), Some((2, 3)));
        assert!(err.to_string().contains("@type is a reserved property name"));

        for source in [
            "protocol P { record R { @name(\"y\") long z; } }",
            "@messages({}) protocol P {}",
            "protocol P { @fields([]) record R {} }",
            "protocol P { @response(\"int\") void ping(); }",
            "protocol P { void ping(@default(1) int x); }",
        ] {
            let err = parse_idl(source).unwrap_err();
            assert!(err.to_string().contains("reserved"), "{source}: {err}");
        }
    }

    #[test]
    fn test_namespace_annotation_on_field_rejected() {
        let err = parse_idl("protocol P { record R { @namespace(\"a.b\") int x; } }").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_custom_annotations_keep_structure() {
        let protocol = parse_idl("protocol P { record R { @java_class(\"Int\") int x; } }")
            .expect("Failed to parse");
        let reparsed = crate::parser::parse_protocol(&protocol.to_canonical_string())
            .expect("Failed to reparse");
        assert_eq!(protocol, reparsed);
        let TypeDef::Record(record) = &reparsed.types[0] else {
            panic!("expected record");
        };
        assert_eq!(record.fields[0].name, "x");
        assert_eq!(record.fields[0].schema, Schema::Int);
    }

    #[test]
    fn test_escaping_namespace_rejected() {
        let err = parse_idl("@namespace(\"/tmp/elsewhere\") protocol Evil { }").unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
        let err = parse_idl("protocol P { @namespace(\"a/b\") record R {} }").unwrap_err();
        assert!(matches!(err, ParseError::Schema(_)));
    }

    #[test]
    fn test_deeply_nested_type_rejected() {
        let depth = 10_000;
        let source = format!(
            "protocol P {{ record R {{ {}int{} x; }} }}",
            "array<".repeat(depth),
            ">".repeat(depth)
        );
        let err = parse_idl(&source).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
        assert!(err.to_string().contains("nested deeper"));
    }

    #[test]
    fn test_deeply_nested_default_rejected() {
        let depth = 10_000;
        let source = format!(
            "protocol P {{ record R {{ int x = {}1{}; }} }}",
            "[".repeat(depth),
            "]".repeat(depth)
        );
        let err = parse_idl(&source).unwrap_err();
        assert!(err.to_string().contains("nested deeper"));
    }

    #[test]
    fn test_moderate_nesting_accepted() {
        let source = format!(
            "protocol P {{ record R {{ {}int{} x; }} }}",
            "array<".repeat(20),
            ">".repeat(20)
        );
        assert!(parse_idl(&source).is_ok());
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_idl("protocol P {} protocol Q {}").unwrap_err();
        assert!(err.to_string().contains("end of input"));
    }
}
