//! One-call and chunked decoding into [`Value`] trees.

use alloc::vec::Vec;

use crate::{
    builder::{BuildError, ValueBuilder},
    cache::{Interner, NoCache},
    error::{ErrorKind, ParseError},
    options::{BuilderOptions, ParserOptions},
    scanner::Scanner,
    value::{Str, Value},
};

impl BuildError {
    fn into_kind(self) -> ErrorKind {
        match self {
            BuildError::Structural(e) => ErrorKind::Structural(e),
            BuildError::Resource(e) => ErrorKind::Resource(e),
            BuildError::Lexical(e) => ErrorKind::Lexical(e),
        }
    }
}

impl ParseError<BuildError> {
    /// Lifts a builder failure into the matching error kind, keeping the
    /// position.
    #[must_use]
    pub fn flatten(self) -> ParseError {
        let kind = match self.kind {
            ErrorKind::Lexical(e) => ErrorKind::Lexical(e),
            ErrorKind::Structural(e) => ErrorKind::Structural(e),
            ErrorKind::Numeric(e) => ErrorKind::Numeric(e),
            ErrorKind::Resource(e) => ErrorKind::Resource(e),
            ErrorKind::Sink(e) => e.into_kind(),
        };
        ParseError {
            kind,
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }
}

/// Parses one complete document.
///
/// # Errors
///
/// Returns the first lexical, structural or numeric error in `bytes`.
///
/// # Examples
///
/// ```
/// use jsonstack::{Value, parse};
///
/// let v = parse(br#"{"a":1,"b":[1,2,3]}"#).unwrap();
/// assert_eq!(v.get("a"), Some(&Value::Int(1)));
/// assert_eq!(v.to_string(), r#"{"a":1,"b":[1,2,3]}"#);
/// ```
pub fn parse(bytes: &[u8]) -> Result<Value, ParseError> {
    parse_with(bytes, &ParserOptions::default(), NoCache)
}

/// Parses one complete document, forming keys through `interner`.
///
/// With [`ParserOptions::allow_multiple_values`] the last document is
/// returned; use a [`Decoder`] to collect all of them.
///
/// # Errors
///
/// Returns the first error raised by the scanner or the builder.
pub fn parse_with<I: Interner<Str>>(
    bytes: &[u8],
    options: &ParserOptions,
    interner: I,
) -> Result<Value, ParseError> {
    let mut scanner = Scanner::new(*options);
    let mut builder = ValueBuilder::with_interner(BuilderOptions::default(), interner);
    scanner.feed(bytes, &mut builder).map_err(ParseError::flatten)?;
    scanner.finish(&mut builder).map_err(ParseError::flatten)?;
    builder.into_value().map_err(|e| ParseError {
        kind: e.into_kind(),
        offset: scanner.offset(),
        line: scanner.line(),
        column: scanner.column(),
    })
}

/// A scanner and a value builder driven together over chunked input.
///
/// # Examples
///
/// ```
/// use jsonstack::{Decoder, Value};
///
/// let mut decoder = Decoder::default();
/// decoder.feed(br#"{"greeting":"hel"#).unwrap();
/// decoder.feed(br#"lo"}"#).unwrap();
/// let values = decoder.finish().unwrap();
/// assert_eq!(values[0].get("greeting"), Some(&Value::from("hello")));
/// ```
#[derive(Debug)]
pub struct Decoder<I = NoCache> {
    scanner: Scanner,
    builder: ValueBuilder<I>,
}

impl Default for Decoder<NoCache> {
    fn default() -> Self {
        Self::new(ParserOptions::default(), BuilderOptions::default(), NoCache)
    }
}

impl<I: Interner<Str>> Decoder<I> {
    pub fn new(parser: ParserOptions, builder: BuilderOptions, interner: I) -> Self {
        Self {
            scanner: Scanner::new(parser),
            builder: ValueBuilder::with_interner(builder, interner),
        }
    }

    /// Feeds the next chunk of input.
    ///
    /// # Errors
    ///
    /// Returns the first error in the chunk. The decoder then rejects every
    /// call with [`StructuralError::Aborted`](crate::StructuralError::Aborted)
    /// until [`Decoder::reset`].
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        let result = self.scanner.feed(chunk, &mut self.builder);
        self.check(result)
    }

    /// Ends the input and returns the documents completed since the last
    /// call to [`Decoder::take_values`].
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::Truncated`](crate::StructuralError::Truncated)
    /// if a document is incomplete or the input held none.
    pub fn finish(&mut self) -> Result<Vec<Value>, ParseError> {
        let result = self.scanner.finish(&mut self.builder);
        self.check(result)?;
        Ok(self.builder.take_values())
    }

    /// Takes the documents completed so far, for streams of many values.
    pub fn take_values(&mut self) -> Vec<Value> {
        self.builder.take_values()
    }

    pub fn reset(&mut self) {
        self.scanner.reset();
        self.builder.reset();
    }

    #[must_use]
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    #[must_use]
    pub fn interner(&self) -> &I {
        self.builder.interner()
    }

    fn check(&mut self, result: Result<(), ParseError<BuildError>>) -> Result<(), ParseError> {
        result.map_err(|e| {
            self.builder.reset();
            e.flatten()
        })
    }
}
