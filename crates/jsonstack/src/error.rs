use alloc::collections::TryReserveError;
use core::convert::Infallible;

use thiserror::Error;

/// An error raised while scanning or building a document.
///
/// `E` is the error type of the [`Sink`](crate::Sink) that consumed the
/// events; it is [`Infallible`] for the built-in builder and collector.
#[derive(Error, Debug, PartialEq)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError<E = Infallible> {
    pub kind: ErrorKind<E>,
    /// Byte offset of the offending byte from the start of the stream.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Error, Debug, PartialEq)]
pub enum ErrorKind<E = Infallible> {
    #[error("lexical error: {0}")]
    Lexical(#[from] LexicalError),
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
    #[error("numeric error: {0}")]
    Numeric(#[from] NumericError),
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),
    #[error("sink error: {0}")]
    Sink(E),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexicalError {
    #[error("unexpected byte '{}', {expected}", printable(.byte))]
    UnexpectedByte { byte: u8, expected: &'static str },
    #[error("invalid escape sequence '\\{}'", printable(.0))]
    InvalidEscape(u8),
    #[error("invalid hex digit '{}' in unicode escape", printable(.0))]
    InvalidUnicodeEscape(u8),
    #[error("lone surrogate \\u{0:04X}")]
    LoneSurrogate(u16),
    #[error("unescaped control character 0x{0:02X} in string")]
    ControlCharacter(u8),
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("comments are not allowed")]
    CommentsNotAllowed,
    #[error("trailing characters after document")]
    TrailingCharacters,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("'{0}' without a matching open")]
    UnmatchedClose(char),
    #[error("'{close}' closes a container opened with '{open}'")]
    MismatchedClose { open: char, close: char },
    #[error("unexpected '{close}', {expected}")]
    UnexpectedClose { close: char, expected: &'static str },
    #[error("value inside an object without a key")]
    MissingKey,
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("unexpected end of input")]
    Truncated,
    #[error("parser aborted by an earlier error")]
    Aborted,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("malformed number")]
    Malformed,
    #[error("NaN and Infinity are not allowed")]
    NonFiniteNotAllowed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),
}

/// An error raised while encoding a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("cannot encode non-finite float {0}")]
    NonFiniteFloat(&'static str),
    #[error("value nested deeper than {0} levels")]
    TooDeep(usize),
    #[error("float formatting failed")]
    Format(#[from] core::fmt::Error),
}

fn printable(byte: &u8) -> core::ascii::EscapeDefault {
    core::ascii::escape_default(*byte)
}

impl<E> ParseError<E> {
    #[must_use]
    pub fn is_lexical(&self) -> bool {
        matches!(self.kind, ErrorKind::Lexical(_))
    }

    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self.kind, ErrorKind::Structural(_))
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ErrorKind::Numeric(_))
    }

    /// Converts the sink error type, keeping the position.
    pub fn map_sink<F>(self, f: impl FnOnce(E) -> F) -> ParseError<F> {
        let kind = match self.kind {
            ErrorKind::Lexical(e) => ErrorKind::Lexical(e),
            ErrorKind::Structural(e) => ErrorKind::Structural(e),
            ErrorKind::Numeric(e) => ErrorKind::Numeric(e),
            ErrorKind::Resource(e) => ErrorKind::Resource(e),
            ErrorKind::Sink(e) => ErrorKind::Sink(f(e)),
        };
        ParseError {
            kind,
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }
}

impl ParseError<Infallible> {
    /// Widens an error from an infallible sink into any sink error type.
    pub fn widen<F>(self) -> ParseError<F> {
        self.map_sink(|never| match never {})
    }
}
