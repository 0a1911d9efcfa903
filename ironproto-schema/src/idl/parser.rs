//! Recursive-descent parser for the interface-definition language.

use super::lexer::{Token, TokenKind};
use crate::error::ParseError;
use crate::parser::is_reserved_key;
use crate::types::{
    EnumDef, Field, FixedDef, Message, Props, Protocol, RecordDef, Schema, TypeDef,
};
use serde_json::{Map, Value};

/// Parse result type.
pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest nesting of types or JSON values the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Annotation attached to a declaration: `@name(json)`.
#[derive(Debug)]
struct Annotation {
    name: String,
    value: Value,
    line: u32,
    column: u32,
}

/// Parser over a token stream produced by [`super::lexer::tokenize`].
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Creates a parser. The token stream must end with `Eof`.
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parses a complete compilation unit: one protocol declaration.
    ///
    /// # Errors
    /// Returns `ParseError` on the first syntax error.
    pub fn parse_compilation_unit(&mut self) -> ParseResult<Protocol> {
        let doc = self.current().doc.clone();
        let annotations = self.parse_annotations()?;
        self.expect_keyword("protocol")?;
        let name = self.expect_ident("protocol name")?;

        let mut protocol = Protocol::new(name, None);
        protocol.doc = doc;
        for annotation in annotations {
            match annotation.name.as_str() {
                "namespace" => protocol.namespace = Some(annotation_str(&annotation)?),
                _ => {
                    protocol.props.insert(annotation.name, annotation.value);
                }
            }
        }

        self.expect(&TokenKind::LBrace)?;
        while !self.check(&TokenKind::RBrace) {
            self.parse_declaration(&mut protocol)?;
        }
        self.expect(&TokenKind::RBrace)?;

        if !self.check(&TokenKind::Eof) {
            return Err(self.unexpected("end of input after protocol"));
        }

        Ok(protocol)
    }

    /// Parses one type or message declaration inside the protocol body.
    fn parse_declaration(&mut self, protocol: &mut Protocol) -> ParseResult<()> {
        let doc = self.current().doc.clone();
        let annotations = self.parse_annotations()?;

        let keyword = match &self.current().kind {
            TokenKind::Ident(word) => word.clone(),
            TokenKind::Eof => return Err(self.eof("declaration")),
            _ => return Err(self.unexpected("declaration")),
        };

        match keyword.as_str() {
            "record" | "error" => {
                self.advance();
                let mut record = if keyword == "error" {
                    RecordDef::error(self.expect_ident("error name")?)
                } else {
                    RecordDef::new(self.expect_ident("record name")?)
                };
                record.doc = doc;
                apply_type_annotations(annotations, &mut record.namespace, &mut record.props)?;
                self.expect(&TokenKind::LBrace)?;
                while !self.check(&TokenKind::RBrace) {
                    record.fields.extend(self.parse_field_declaration()?);
                }
                self.expect(&TokenKind::RBrace)?;
                protocol.add_type(TypeDef::Record(record));
            }
            "enum" => {
                self.advance();
                let name = self.expect_ident("enum name")?;
                let mut enum_def = EnumDef::new(name, self.parse_enum_body()?);
                enum_def.doc = doc;
                apply_type_annotations(annotations, &mut enum_def.namespace, &mut enum_def.props)?;
                protocol.add_type(TypeDef::Enum(enum_def));
            }
            "fixed" => {
                self.advance();
                let name = self.expect_ident("fixed name")?;
                self.expect(&TokenKind::LParen)?;
                let size = self.expect_size()?;
                self.expect(&TokenKind::RParen)?;
                self.expect(&TokenKind::Semi)?;
                let mut fixed = FixedDef::new(name, size);
                fixed.doc = doc;
                apply_type_annotations(annotations, &mut fixed.namespace, &mut fixed.props)?;
                protocol.add_type(TypeDef::Fixed(fixed));
            }
            _ => {
                let mut message = self.parse_message()?;
                message.doc = doc;
                apply_member_annotations(annotations, &mut message.props)?;
                protocol.messages.push(message);
            }
        }
        Ok(())
    }

    /// Parses `Type name [= default] (, name [= default])* ;` inside a record.
    fn parse_field_declaration(&mut self) -> ParseResult<Vec<Field>> {
        let doc = self.current().doc.clone();
        let annotations = self.parse_annotations()?;
        let mut props = Props::new();
        apply_member_annotations(annotations, &mut props)?;
        let schema = self.parse_type()?;

        let mut fields = Vec::new();
        loop {
            let var_doc = self.current().doc.clone();
            let name = self.expect_ident("field name")?;
            let mut field = Field::new(name, schema.clone());
            field.doc = var_doc.or_else(|| doc.clone());
            field.props = props.clone();
            if self.eat(&TokenKind::Eq) {
                field.default = Some(self.parse_json()?);
            }
            fields.push(field);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semi)?;
        Ok(fields)
    }

    /// Parses `{ A, B, C }` with an optional trailing comma.
    fn parse_enum_body(&mut self) -> ParseResult<Vec<String>> {
        self.expect(&TokenKind::LBrace)?;
        let mut symbols = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            symbols.push(self.expect_ident("enum symbol")?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(symbols)
    }

    /// Parses `Response name(params) [throws E, ...] [oneway];`.
    fn parse_message(&mut self) -> ParseResult<Message> {
        let response = if self.check_keyword("void") {
            self.advance();
            Schema::Null
        } else {
            self.parse_type()?
        };
        let name = self.expect_ident("message name")?;
        let mut message = Message::new(name, response);

        self.expect(&TokenKind::LParen)?;
        while !self.check(&TokenKind::RParen) {
            let doc = self.current().doc.clone();
            let annotations = self.parse_annotations()?;
            let schema = self.parse_type()?;
            let mut param = Field::new(self.expect_ident("parameter name")?, schema);
            param.doc = doc;
            apply_member_annotations(annotations, &mut param.props)?;
            if self.eat(&TokenKind::Eq) {
                param.default = Some(self.parse_json()?);
            }
            message.request.push(param);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        if self.check_keyword("throws") {
            self.advance();
            loop {
                message.errors.push(self.expect_ident("error type")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        if self.check_keyword("oneway") {
            self.advance();
            message.one_way = true;
        }
        self.expect(&TokenKind::Semi)?;
        Ok(message)
    }

    /// Parses a field type.
    fn parse_type(&mut self) -> ParseResult<Schema> {
        self.enter("type")?;
        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> ParseResult<Schema> {
        let word = match &self.current().kind {
            TokenKind::Ident(word) => word.clone(),
            TokenKind::Eof => return Err(self.eof("type")),
            _ => return Err(self.unexpected("type")),
        };

        match word.as_str() {
            "array" | "map" => {
                self.advance();
                self.expect(&TokenKind::LAngle)?;
                let inner = Box::new(self.parse_type()?);
                self.expect(&TokenKind::RAngle)?;
                Ok(if word == "array" {
                    Schema::Array(inner)
                } else {
                    Schema::Map(inner)
                })
            }
            "union" => {
                self.advance();
                self.expect(&TokenKind::LBrace)?;
                let mut branches = vec![self.parse_type()?];
                while self.eat(&TokenKind::Comma) {
                    branches.push(self.parse_type()?);
                }
                self.expect(&TokenKind::RBrace)?;
                Ok(Schema::Union(branches))
            }
            "void" => Err(self.syntax("'void' is only allowed as a message response")),
            _ => {
                self.advance();
                Ok(Schema::primitive(&word).unwrap_or(Schema::Named(word)))
            }
        }
    }

    /// Parses zero or more `@name(json)` annotations.
    fn parse_annotations(&mut self) -> ParseResult<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.check(&TokenKind::At) {
            let (line, column) = (self.current().line, self.current().column);
            self.advance();
            let name = self.expect_ident("annotation name")?;
            if name != "namespace" && is_reserved_key(&name) {
                return Err(ParseError::syntax(
                    line,
                    column,
                    format!("@{name} is a reserved property name"),
                ));
            }
            self.expect(&TokenKind::LParen)?;
            let value = self.parse_json()?;
            self.expect(&TokenKind::RParen)?;
            annotations.push(Annotation {
                name,
                value,
                line,
                column,
            });
        }
        Ok(annotations)
    }

    /// Parses a JSON literal (defaults and annotation values).
    fn parse_json(&mut self) -> ParseResult<Value> {
        self.enter("JSON value")?;
        let result = self.parse_json_inner();
        self.depth -= 1;
        result
    }

    fn parse_json_inner(&mut self) -> ParseResult<Value> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Str(raw) => {
                self.advance();
                decode_string(raw, &token)
            }
            TokenKind::Number(raw) => {
                self.advance();
                serde_json::from_str(raw)
                    .map_err(|e| ParseError::syntax(token.line, token.column, e.to_string()))
            }
            TokenKind::Ident(word) => {
                let value = match word.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "null" => Value::Null,
                    _ => return Err(self.unexpected("JSON value")),
                };
                self.advance();
                Ok(value)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    items.push(self.parse_json()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket)?;
                Ok(Value::Array(items))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut obj = Map::new();
                while !self.check(&TokenKind::RBrace) {
                    let key_token = self.current().clone();
                    let TokenKind::Str(raw) = &key_token.kind else {
                        return Err(self.unexpected("JSON object key"));
                    };
                    self.advance();
                    let Value::String(key) = decode_string(raw, &key_token)? else {
                        return Err(self.unexpected("JSON object key"));
                    };
                    self.expect(&TokenKind::Colon)?;
                    obj.insert(key, self.parse_json()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace)?;
                Ok(Value::Object(obj))
            }
            TokenKind::Eof => Err(self.eof("JSON value")),
            _ => Err(self.unexpected("JSON value")),
        }
    }

    fn expect_size(&mut self) -> ParseResult<usize> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Number(raw) => {
                let size = raw.parse::<usize>().map_err(|_| {
                    ParseError::syntax(token.line, token.column, format!("invalid fixed size {raw}"))
                })?;
                self.advance();
                Ok(size)
            }
            TokenKind::Eof => Err(self.eof("fixed size")),
            _ => Err(self.unexpected("fixed size")),
        }
    }

    // Token stream helpers

    fn enter(&mut self, what: &str) -> ParseResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.syntax(format!(
                "{what} nested deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.current().kind, TokenKind::Ident(word) if word == keyword)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else if self.check(&TokenKind::Eof) {
            Err(self.eof(&kind.to_string()))
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else if self.check(&TokenKind::Eof) {
            Err(self.eof(&format!("'{keyword}'")))
        } else {
            Err(self.unexpected(&format!("'{keyword}'")))
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<String> {
        match &self.current().kind {
            TokenKind::Ident(word) => {
                let word = word.clone();
                self.advance();
                Ok(word)
            }
            TokenKind::Eof => Err(self.eof(what)),
            _ => Err(self.unexpected(what)),
        }
    }

    fn syntax(&self, message: impl Into<String>) -> ParseError {
        let token = self.current();
        ParseError::syntax(token.line, token.column, message)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.syntax(format!("expected {}, found {}", expected, self.current().kind))
    }

    fn eof(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError::UnexpectedEof {
            line: token.line,
            column: token.column,
            expected: expected.to_string(),
        }
    }
}

/// Applies `@namespace` to a named type; other annotations become props.
fn apply_type_annotations(
    annotations: Vec<Annotation>,
    namespace: &mut Option<String>,
    props: &mut Props,
) -> ParseResult<()> {
    for annotation in annotations {
        if annotation.name == "namespace" {
            *namespace = Some(annotation_str(&annotation)?);
        } else {
            props.insert(annotation.name, annotation.value);
        }
    }
    Ok(())
}

/// Turns annotations on a field, parameter or message into props.
fn apply_member_annotations(annotations: Vec<Annotation>, props: &mut Props) -> ParseResult<()> {
    for annotation in annotations {
        if annotation.name == "namespace" {
            return Err(ParseError::syntax(
                annotation.line,
                annotation.column,
                "@namespace is only allowed on protocols and named types",
            ));
        }
        props.insert(annotation.name, annotation.value);
    }
    Ok(())
}

fn annotation_str(annotation: &Annotation) -> ParseResult<String> {
    match &annotation.value {
        Value::String(s) => Ok(s.clone()),
        other => Err(ParseError::syntax(
            annotation.line,
            annotation.column,
            format!("@{} expects a string, found {}", annotation.name, other),
        )),
    }
}

fn decode_string(raw: &str, token: &Token) -> ParseResult<Value> {
    serde_json::from_str::<String>(raw)
        .map(Value::String)
        .map_err(|e| ParseError::syntax(token.line, token.column, format!("invalid string: {e}")))
}
