//! Parse-time errors.
//!
//! Every error the front end can raise is fatal: parsing stops at the first
//! one and the whole compilation fails. [`ParseErrorKind`] enumerates the
//! recognized failure kinds; [`ParseError`] pairs a kind with the source
//! span that triggered it, so callers can match on a structured kind
//! instead of a string.

use simple_base::Span;
use std::fmt;

/// The distinct ways a Simple program can fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The scanner found a byte that starts no valid token.
    UnexpectedChar(char),
    /// A decimal literal has a leading zero followed by more digits (`007`).
    LeadingZero,
    /// The parser expected one token and found another.
    ExpectedToken { expected: &'static str, found: String },
    /// An identifier was used without ever being defined in a visible scope.
    UndefinedName(String),
    /// A name was defined twice in the same lexical scope.
    DuplicateDefinition(String),
    /// `break` or `continue` appeared outside any enclosing loop.
    LoopControlOutsideLoop(&'static str),
    /// A name was used as a struct type but no such struct was declared.
    UnknownStruct(String),
    /// `.field` named a field the struct type does not have.
    UnknownField { struct_name: String, field: String },
    /// A name is defined on only one arm of an `if`, so it escapes with two
    /// incompatible meanings — or no meaning at all — after the merge.
    DivergentDefinition(String),
    /// Field access through a pointer statically known to carry no struct
    /// type at all (a bare `null` literal used with no declared context).
    NullDereference,
    /// A struct name is already in the registry.
    StructRedefined(String),
    /// `struct` appeared somewhere other than the outermost scope.
    StructNotTopLevel,
    /// `struct Name {}` declared zero fields.
    EmptyStruct(String),
    /// A declaration's initializer doesn't match its declared type.
    TypeMismatch { expected: String, found: String },
    /// The token stream ended before a construct was closed.
    UnexpectedEof,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedChar(c) => write!(f, "unexpected character '{c}'"),
            ParseErrorKind::LeadingZero => {
                write!(f, "integer literals may not have a leading zero")
            }
            ParseErrorKind::ExpectedToken { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            ParseErrorKind::UndefinedName(name) => write!(f, "undefined name '{name}'"),
            ParseErrorKind::DuplicateDefinition(name) => {
                write!(f, "'{name}' is already defined in this scope")
            }
            ParseErrorKind::LoopControlOutsideLoop(kw) => {
                write!(f, "'{kw}' outside of a loop")
            }
            ParseErrorKind::UnknownStruct(name) => write!(f, "unknown struct type '{name}'"),
            ParseErrorKind::UnknownField { struct_name, field } => {
                write!(f, "struct '{struct_name}' has no field '{field}'")
            }
            ParseErrorKind::DivergentDefinition(name) => write!(
                f,
                "'{name}' is not defined consistently on both arms of the if"
            ),
            ParseErrorKind::NullDereference => {
                write!(f, "field access through a pointer known to be null")
            }
            ParseErrorKind::StructRedefined(name) => write!(f, "struct '{name}' is already defined"),
            ParseErrorKind::StructNotTopLevel => {
                write!(f, "struct declarations are only allowed at the outermost scope")
            }
            ParseErrorKind::EmptyStruct(name) => write!(f, "struct '{name}' declares no fields"),
            ParseErrorKind::TypeMismatch { expected, found } => {
                write!(f, "expected a value of type {expected}, found {found}")
            }
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of input"),
        }
    }
}

/// A fatal parse error together with the span that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError { kind, span }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.kind, self.span.start, self.span.end)
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_span() {
        let err = ParseError::new(ParseErrorKind::UndefinedName("x".into()), Span::new(4, 5));
        assert_eq!(err.to_string(), "undefined name 'x' at 4..5");
    }
}
