//! Lexer for the interface-definition language.
//!
//! Token recognition is done by `logos`; this module adds source positions
//! and attaches `/** ... */` doc comments to the token that follows them.

use crate::error::ParseError;
use logos::Logos;
use std::fmt;

/// All possible token types in the interface-definition language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    /// Identifier, keyword, or dotted full name. Backquoted identifiers
    /// lose their quotes.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*", |lex| lex.slice().to_owned())]
    #[regex(r"`[A-Za-z_][A-Za-z0-9_]*`", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_owned()
    })]
    Ident(String),

    /// String literal, kept verbatim (quotes and escapes included).
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice().to_owned())]
    Str(String),

    /// Numeric literal, kept verbatim.
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().to_owned())]
    Number(String),

    /// Block comment; `Some` carries the text of a doc comment.
    #[token("/*", block_comment)]
    Comment(Option<String>),

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("=")]
    Eq,
    #[token(":")]
    Colon,
    #[token("@")]
    At,

    /// End of input (never produced by logos, appended by [`tokenize`]).
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier '{name}'"),
            Self::Str(raw) => write!(f, "string {raw}"),
            Self::Number(raw) => write!(f, "number {raw}"),
            Self::Comment(_) => write!(f, "comment"),
            Self::LBrace => write!(f, "'{{'"),
            Self::RBrace => write!(f, "'}}'"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::LAngle => write!(f, "'<'"),
            Self::RAngle => write!(f, "'>'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::Semi => write!(f, "';'"),
            Self::Comma => write!(f, "','"),
            Self::Eq => write!(f, "'='"),
            Self::Colon => write!(f, "':'"),
            Self::At => write!(f, "'@'"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// Consumes a block comment body up to and including `*/`.
fn block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> Option<Option<String>> {
    let rest = lex.remainder();
    let end = rest.find("*/")?;
    let body = &rest[..end];
    lex.bump(end + 2);
    if body.len() > 1 && body.starts_with('*') {
        Some(Some(clean_doc(&body[1..])))
    } else {
        Some(None)
    }
}

/// Strips comment decoration (leading `*` on each line) from a doc comment.
fn clean_doc(body: &str) -> String {
    body.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map(str::trim_start).unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, in characters).
    pub column: u32,
    /// Doc comment immediately preceding this token.
    pub doc: Option<String>,
}

/// Maps byte offsets to line/column positions.
struct LineIndex<'src> {
    source: &'src str,
    starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    fn new(source: &'src str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { source, starts }
    }

    fn position(&self, offset: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        (line as u32, column as u32)
    }
}

/// Splits source text into positioned tokens, ending with [`TokenKind::Eof`].
///
/// # Errors
/// Returns `ParseError::Syntax` for characters that start no token and for
/// unterminated block comments.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let index = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut pending_doc = None;

    for (result, span) in TokenKind::lexer(source).spanned() {
        let (line, column) = index.position(span.start);
        match result {
            Ok(TokenKind::Comment(doc)) => {
                if doc.is_some() {
                    pending_doc = doc;
                }
            }
            Ok(kind) => tokens.push(Token {
                kind,
                line,
                column,
                doc: pending_doc.take(),
            }),
            Err(()) => {
                let text = &source[span.clone()];
                let message = if text.starts_with("/*") {
                    "unterminated block comment".to_string()
                } else {
                    format!("unexpected character '{}'", text.chars().next().unwrap_or('?'))
                };
                return Err(ParseError::syntax(line, column, message));
            }
        }
    }

    let (line, column) = index.position(source.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        column,
        doc: None,
    });
    Ok(tokens)
}
