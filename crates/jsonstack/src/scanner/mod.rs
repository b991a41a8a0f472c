//! Table-driven, resumable JSON scanner.
//!
//! Overview
//! - The scanner consumes input in chunks of bytes and reports the document
//!   to a [`Sink`] in order. A chunk may end anywhere, including inside a
//!   string, an escape, a number, a literal or a comment; the scanner keeps
//!   enough state to resume on the next [`Scanner::feed`].
//! - Between tokens the current structural state selects a [`Dispatch`]
//!   table mapping the next byte to an action. Bytes with no valid action
//!   raise an error carrying the state's message.
//!
//! Borrowing
//! - A string without escapes that lies entirely in the current chunk is
//!   handed to the sink as a slice of that chunk. Otherwise its bytes are
//!   copied into `scratch` as they are decoded, and the sink sees the
//!   scratch.
//! - Numbers work the same way: the literal's text is borrowed when the whole
//!   literal is in one chunk and copied otherwise.
//!
//! Positions
//! - Offsets count bytes from the start of the stream. Lines start at 1 and
//!   are separated by `\n`; columns count bytes from the start of the line,
//!   starting at 1.

#![allow(clippy::inline_always)]

mod string;
mod tables;

use alloc::{string::String, vec::Vec};

pub use crate::event::{Event, EventCollector, Token};
use crate::{
    error::{ErrorKind, LexicalError, NumericError, ParseError, ResourceError, StructuralError},
    number::{Number, NumberAccumulator, Step},
    options::ParserOptions,
    sink::{Container, Context, Sink},
};
use string::UnicodeEscape;
use tables::{Action, BACKSLASH, CONTROL, Dispatch, QUOTE, STRING_CLASS};

/// Structural state: what may come next between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Value,
    ArrayFirst,
    ObjectFirst,
    ObjectKey,
    Colon,
    AfterArrayValue,
    AfterObjectValue,
    Done,
}

impl State {
    #[inline(always)]
    fn table(self) -> &'static Dispatch {
        match self {
            State::Value => &tables::VALUE,
            State::ArrayFirst => &tables::ARRAY_FIRST,
            State::ObjectFirst => &tables::OBJECT_FIRST,
            State::ObjectKey => &tables::OBJECT_KEY,
            State::Colon => &tables::COLON,
            State::AfterArrayValue => &tables::AFTER_ARRAY_VALUE,
            State::AfterObjectValue => &tables::AFTER_OBJECT_VALUE,
            State::Done => &tables::DONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Array,
    Object,
}

impl Bracket {
    fn open(self) -> char {
        match self {
            Bracket::Array => '[',
            Bracket::Object => '{',
        }
    }

    fn close(self) -> char {
        match self {
            Bracket::Array => ']',
            Bracket::Object => '}',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteralKind {
    True,
    False,
    Null,
    NaN,
    Infinity,
    NegInfinity,
}

impl LiteralKind {
    fn text(self) -> &'static [u8] {
        match self {
            LiteralKind::True => b"true",
            LiteralKind::False => b"false",
            LiteralKind::Null => b"null",
            LiteralKind::NaN => b"NaN",
            LiteralKind::Infinity => b"Infinity",
            LiteralKind::NegInfinity => b"-Infinity",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            LiteralKind::True => "expected 'true'",
            LiteralKind::False => "expected 'false'",
            LiteralKind::Null => "expected 'null'",
            LiteralKind::NaN => "expected 'NaN'",
            LiteralKind::Infinity => "expected 'Infinity'",
            LiteralKind::NegInfinity => "expected '-Infinity'",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    /// After the opening `/`.
    Start,
    Line,
    Block,
    /// Inside a block comment, after a `*`.
    BlockStar,
}

/// Lexical state: the token in progress, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex {
    Idle,
    String,
    Escape,
    Unicode(UnicodeEscape),
    /// A high surrogate was decoded; expecting `\`.
    SurrogateBackslash(u16),
    /// A high surrogate and `\` were seen; expecting `u`.
    SurrogateU(u16),
    Number,
    Literal { kind: LiteralKind, matched: u8 },
    Comment(Comment),
}

/// A resumable JSON scanner.
///
/// # Examples
///
/// ```rust
/// use jsonstack::{Event, ParserOptions, Scanner};
///
/// let mut scanner = Scanner::new(ParserOptions::default());
/// let tokens = scanner.scan(br#"{"a":[1,true]}"#).unwrap();
/// let events: Vec<_> = tokens.into_iter().map(|t| t.event).collect();
/// assert_eq!(
///     events,
///     [
///         Event::OpenObject,
///         Event::OpenArray,
///         Event::Int(1),
///         Event::True,
///         Event::CloseArray,
///         Event::CloseObject,
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct Scanner {
    options: ParserOptions,
    state: State,
    lex: Lex,
    stack: Vec<Bracket>,
    /// Whether the string in progress is an object key.
    in_key: bool,
    /// Stream offset of the first byte of the current chunk.
    base: usize,
    line: usize,
    /// Stream offset of the first byte of the current line.
    line_start: usize,
    /// Stream offset of the first byte of the token in progress.
    token_start: usize,
    /// Chunk index where the not-yet-copied part of the token starts.
    run_start: usize,
    /// Whether the token in progress lives in `scratch`.
    buffered: bool,
    scratch: Vec<u8>,
    key: String,
    number: NumberAccumulator,
    documents: usize,
    poisoned: bool,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Scanner {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            state: State::Value,
            lex: Lex::Idle,
            stack: Vec::new(),
            in_key: false,
            base: 0,
            line: 1,
            line_start: 0,
            token_start: 0,
            run_start: 0,
            buffered: false,
            scratch: Vec::new(),
            key: String::new(),
            number: NumberAccumulator::new(),
            documents: 0,
            poisoned: false,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Returns the scanner to its initial state, keeping its buffers.
    pub fn reset(&mut self) {
        self.state = State::Value;
        self.lex = Lex::Idle;
        self.stack.clear();
        self.in_key = false;
        self.base = 0;
        self.line = 1;
        self.line_start = 0;
        self.token_start = 0;
        self.run_start = 0;
        self.buffered = false;
        self.scratch.clear();
        self.key.clear();
        self.number = NumberAccumulator::new();
        self.documents = 0;
        self.poisoned = false;
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.base
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.base - self.line_start + 1
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of complete top-level documents seen since the last reset.
    #[must_use]
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Feeds one chunk of input, reporting every completed token to `sink`.
    ///
    /// # Errors
    ///
    /// Returns the first error found in the chunk, or an error raised by the
    /// sink. After an error every call fails with
    /// [`StructuralError::Aborted`] until [`Scanner::reset`].
    pub fn feed<S: Sink + ?Sized>(
        &mut self,
        chunk: &[u8],
        sink: &mut S,
    ) -> Result<(), ParseError<S::Error>> {
        if self.poisoned {
            return Err(self.aborted());
        }
        self.run_start = 0;
        let mut i = 0;
        while i < chunk.len() {
            i = match self.lex {
                Lex::Idle => self.structural(chunk, i, sink)?,
                Lex::String => self.string(chunk, i, sink)?,
                Lex::Escape => self.escape::<S::Error>(chunk, i)?,
                Lex::Unicode(esc) => self.unicode::<S::Error>(esc, chunk, i)?,
                Lex::SurrogateBackslash(high) => {
                    self.surrogate_backslash::<S::Error>(high, chunk, i)?
                },
                Lex::SurrogateU(high) => self.surrogate_u::<S::Error>(high, chunk, i)?,
                Lex::Number => self.number(chunk, i, sink)?,
                Lex::Literal { kind, matched } => self.literal(kind, matched, chunk, i, sink)?,
                Lex::Comment(comment) => self.comment::<S::Error>(comment, chunk, i)?,
            };
        }
        if matches!(self.lex, Lex::String | Lex::Number) {
            let rest = &chunk[self.run_start..];
            self.push_bytes::<S::Error>(rest, self.base + chunk.len())?;
            self.buffered = true;
        }
        self.base += chunk.len();
        Ok(())
    }

    /// Signals the end of input.
    ///
    /// A number still in progress is completed. On success the scanner is
    /// reset and ready for a new stream.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::Truncated`] if no document was seen or a
    /// value or container is still open, and
    /// [`LexicalError::UnterminatedString`] for an open string unless
    /// [`ParserOptions::allow_invalid_unicode`] is set.
    pub fn finish<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<(), ParseError<S::Error>> {
        if self.poisoned {
            return Err(self.aborted());
        }
        let end = self.base;
        match self.lex {
            Lex::Idle | Lex::Comment(Comment::Line) => {}
            Lex::Number => self.end_number(&[], sink)?,
            Lex::String
            | Lex::Escape
            | Lex::Unicode(_)
            | Lex::SurrogateBackslash(_)
            | Lex::SurrogateU(_) => {
                if !self.options.allow_invalid_unicode {
                    return Err(self.fail(LexicalError::UnterminatedString, self.token_start));
                }
                if self.lex != Lex::String {
                    self.push_scalar::<S::Error>(char::REPLACEMENT_CHARACTER, end)?;
                }
                self.buffered = true;
                self.close_string(&[], sink)?;
            }
            Lex::Literal { .. } | Lex::Comment(_) => {
                return Err(self.fail(StructuralError::Truncated, end));
            }
        }
        if self.state != State::Done {
            return Err(self.fail(StructuralError::Truncated, end));
        }
        tracing::trace!(bytes = end, documents = self.documents, "scan finished");
        self.reset();
        Ok(())
    }

    /// Scans one complete input into owned tokens.
    ///
    /// # Errors
    ///
    /// Returns the first error in `bytes`, as [`Scanner::feed`] and
    /// [`Scanner::finish`] would.
    pub fn scan(&mut self, bytes: &[u8]) -> Result<Vec<Token>, ParseError> {
        let mut collector = EventCollector::new();
        self.feed(bytes, &mut collector)?;
        self.finish(&mut collector)?;
        Ok(collector.tokens)
    }

    #[cold]
    fn fail<E>(&mut self, kind: impl Into<ErrorKind<E>>, offset: usize) -> ParseError<E> {
        self.poisoned = true;
        let line = self.line;
        let column = offset.saturating_sub(self.line_start) + 1;
        tracing::debug!(
            offset,
            line,
            column,
            state = self.state.table().name,
            "scan failed"
        );
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(
            !self.options.panic_on_error,
            "scan failed at {line}:{column} (offset {offset})"
        );
        ParseError {
            kind: kind.into(),
            offset,
            line,
            column,
        }
    }

    fn aborted<E>(&self) -> ParseError<E> {
        ParseError {
            kind: StructuralError::Aborted.into(),
            offset: self.base,
            line: self.line,
            column: self.column(),
        }
    }

    #[inline]
    fn newline(&mut self, offset: usize) {
        self.line += 1;
        self.line_start = offset + 1;
    }

    fn context(&self, offset: usize) -> Context<'_> {
        let (container, key) = match self.stack.last() {
            None => (Container::TopLevel, None),
            Some(Bracket::Array) => (Container::Array, None),
            Some(Bracket::Object) => (Container::Object, Some(self.key.as_str())),
        };
        Context {
            container,
            key,
            offset,
        }
    }

    fn after_value(&mut self) {
        self.state = match self.stack.last() {
            None => {
                self.documents += 1;
                State::Done
            }
            Some(Bracket::Array) => State::AfterArrayValue,
            Some(Bracket::Object) => State::AfterObjectValue,
        };
    }

    fn begin_token(&mut self, offset: usize, run_start: usize) {
        self.token_start = offset;
        self.run_start = run_start;
        self.buffered = false;
        self.scratch.clear();
    }

    fn push_bytes<E>(&mut self, bytes: &[u8], offset: usize) -> Result<(), ParseError<E>> {
        if let Err(e) = self.scratch.try_reserve(bytes.len()) {
            return Err(self.fail(ResourceError::from(e), offset));
        }
        self.scratch.extend_from_slice(bytes);
        Ok(())
    }

    fn push_scalar<E>(&mut self, ch: char, offset: usize) -> Result<(), ParseError<E>> {
        let mut tmp = [0u8; 4];
        self.push_bytes(ch.encode_utf8(&mut tmp).as_bytes(), offset)
    }

    fn structural<S: Sink + ?Sized>(
        &mut self,
        chunk: &[u8],
        i: usize,
        sink: &mut S,
    ) -> Result<usize, ParseError<S::Error>> {
        let b = chunk[i];
        let offset = self.base + i;
        let table = self.state.table();
        let action = table.action(b);
        #[cfg(trace_scanner)]
        tracing::trace!(offset, byte = b, state = table.name, ?action, "dispatch");
        match action {
            Action::Skip => {
                if b == b'\n' {
                    self.newline(offset);
                }
            }
            Action::Comment => {
                if !self.options.allow_comments {
                    return Err(self.fail(LexicalError::CommentsNotAllowed, offset));
                }
                self.lex = Lex::Comment(Comment::Start);
            }
            Action::OpenArray => self.open(Bracket::Array, offset, sink)?,
            Action::OpenObject => self.open(Bracket::Object, offset, sink)?,
            Action::CloseArray => self.close(Bracket::Array, offset, sink)?,
            Action::CloseObject => self.close(Bracket::Object, offset, sink)?,
            Action::Colon => self.state = State::Value,
            Action::Comma => {
                self.state = if self.state == State::AfterObjectValue {
                    State::ObjectKey
                } else {
                    State::Value
                };
            }
            Action::String => {
                self.in_key = matches!(self.state, State::ObjectFirst | State::ObjectKey);
                self.begin_token(offset, i + 1);
                self.lex = Lex::String;
            }
            Action::Number => {
                self.begin_token(offset, i);
                self.number = NumberAccumulator::new();
                let _ = self.number.push(b);
                self.lex = Lex::Number;
            }
            Action::True => self.begin_literal::<S::Error>(LiteralKind::True, offset)?,
            Action::False => self.begin_literal::<S::Error>(LiteralKind::False, offset)?,
            Action::Null => self.begin_literal::<S::Error>(LiteralKind::Null, offset)?,
            Action::NaN => self.begin_literal::<S::Error>(LiteralKind::NaN, offset)?,
            Action::Infinity => self.begin_literal::<S::Error>(LiteralKind::Infinity, offset)?,
            Action::NextDocument => {
                if !self.options.allow_multiple_values {
                    return Err(self.fail(LexicalError::TrailingCharacters, offset));
                }
                // Dispatch the same byte again as the start of a new document.
                self.state = State::Value;
                return Ok(i);
            }
            Action::Error => {
                let error = if self.state == State::Done {
                    LexicalError::TrailingCharacters
                } else {
                    LexicalError::UnexpectedByte {
                        byte: b,
                        expected: table.expected,
                    }
                };
                return Err(self.fail(error, offset));
            }
        }
        Ok(i + 1)
    }

    fn open<S: Sink + ?Sized>(
        &mut self,
        bracket: Bracket,
        offset: usize,
        sink: &mut S,
    ) -> Result<(), ParseError<S::Error>> {
        let limit = self.options.max_depth;
        if self.stack.len() >= limit {
            return Err(self.fail(StructuralError::TooDeep(limit), offset));
        }
        let ctx = self.context(offset);
        let result = match bracket {
            Bracket::Array => sink.open_array(ctx),
            Bracket::Object => sink.open_object(ctx),
        };
        if let Err(e) = result {
            return Err(self.fail(ErrorKind::Sink(e), offset));
        }
        if let Err(e) = self.stack.try_reserve(1) {
            return Err(self.fail(ResourceError::from(e), offset));
        }
        self.stack.push(bracket);
        self.state = match bracket {
            Bracket::Array => State::ArrayFirst,
            Bracket::Object => State::ObjectFirst,
        };
        Ok(())
    }

    fn close<S: Sink + ?Sized>(
        &mut self,
        bracket: Bracket,
        offset: usize,
        sink: &mut S,
    ) -> Result<(), ParseError<S::Error>> {
        let close = bracket.close();
        let Some(&top) = self.stack.last() else {
            return Err(self.fail(StructuralError::UnmatchedClose(close), offset));
        };
        if top != bracket {
            let open = top.open();
            return Err(self.fail(StructuralError::MismatchedClose { open, close }, offset));
        }
        let accepted = match bracket {
            Bracket::Array => matches!(self.state, State::ArrayFirst | State::AfterArrayValue),
            Bracket::Object => matches!(self.state, State::ObjectFirst | State::AfterObjectValue),
        };
        if !accepted {
            let expected = self.state.table().expected;
            return Err(self.fail(StructuralError::UnexpectedClose { close, expected }, offset));
        }
        self.stack.pop();
        let result = match bracket {
            Bracket::Array => sink.close_array(offset),
            Bracket::Object => sink.close_object(offset),
        };
        if let Err(e) = result {
            return Err(self.fail(ErrorKind::Sink(e), offset));
        }
        self.after_value();
        Ok(())
    }

    fn string<S: Sink + ?Sized>(
        &mut self,
        chunk: &[u8],
        i: usize,
        sink: &mut S,
    ) -> Result<usize, ParseError<S::Error>> {
        let end = string::plain_run(chunk, i);
        let Some(&b) = chunk.get(end) else {
            return Ok(end);
        };
        match STRING_CLASS[b as usize] {
            QUOTE => {
                self.close_string(&chunk[self.run_start..end], sink)?;
                Ok(end + 1)
            }
            BACKSLASH => {
                self.push_bytes::<S::Error>(&chunk[self.run_start..end], self.base + end)?;
                self.buffered = true;
                self.lex = Lex::Escape;
                Ok(end + 1)
            }
            CONTROL => Err(self.fail(LexicalError::ControlCharacter(b), self.base + end)),
            _ => Ok(end + 1),
        }
    }

    /// Completes the string in progress; `tail` is its content in the
    /// current chunk that has not been copied yet.
    fn close_string<S: Sink + ?Sized>(
        &mut self,
        tail: &[u8],
        sink: &mut S,
    ) -> Result<(), ParseError<S::Error>> {
        let start = self.token_start;
        let tail_offset = self.base + self.run_start;
        self.lex = Lex::Idle;
        if self.buffered {
            self.push_bytes::<S::Error>(tail, tail_offset + tail.len())?;
        }
        let bytes = if self.buffered {
            self.scratch.as_slice()
        } else {
            tail
        };
        let text = match string::decode(bytes, self.options.allow_invalid_unicode) {
            Ok(text) => text,
            Err(valid) => {
                let offset = if self.buffered {
                    start
                } else {
                    tail_offset + valid
                };
                return Err(self.fail(LexicalError::InvalidUtf8, offset));
            }
        };

        if self.in_key {
            self.key.clear();
            self.key.push_str(&text);
            self.state = State::Colon;
            return Ok(());
        }

        let result = sink.add_str(self.context(start), &text);
        drop(text);
        if let Err(e) = result {
            return Err(self.fail(ErrorKind::Sink(e), start));
        }
        self.after_value();
        Ok(())
    }

    fn resume_string(&mut self, run_start: usize) {
        self.lex = Lex::String;
        self.run_start = run_start;
    }

    fn escape<E>(&mut self, chunk: &[u8], i: usize) -> Result<usize, ParseError<E>> {
        let b = chunk[i];
        let offset = self.base + i;
        let decoded = match b {
            b'"' | b'\\' | b'/' => b,
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                self.lex = Lex::Unicode(UnicodeEscape::default());
                return Ok(i + 1);
            }
            _ => return Err(self.fail(LexicalError::InvalidEscape(b), offset)),
        };
        self.push_bytes::<E>(&[decoded], offset)?;
        self.resume_string(i + 1);
        Ok(i + 1)
    }

    fn unicode<E>(
        &mut self,
        mut esc: UnicodeEscape,
        chunk: &[u8],
        i: usize,
    ) -> Result<usize, ParseError<E>> {
        let offset = self.base + i;
        let unit = match esc.feed(chunk[i]) {
            Ok(Some(unit)) => unit,
            Ok(None) => {
                self.lex = Lex::Unicode(esc);
                return Ok(i + 1);
            }
            Err(e) => return Err(self.fail(e, offset)),
        };
        if let Some(high) = esc.high {
            if string::is_low_surrogate(unit) {
                self.push_scalar::<E>(string::combine_surrogates(high, unit), offset)?;
                self.resume_string(i + 1);
                return Ok(i + 1);
            }
            self.lone_surrogate::<E>(high, offset)?;
        }
        if string::is_high_surrogate(unit) {
            self.lex = Lex::SurrogateBackslash(unit);
            return Ok(i + 1);
        }
        if string::is_low_surrogate(unit) {
            self.lone_surrogate::<E>(unit, offset)?;
        } else {
            let ch = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
            self.push_scalar::<E>(ch, offset)?;
        }
        self.resume_string(i + 1);
        Ok(i + 1)
    }

    fn lone_surrogate<E>(&mut self, unit: u16, offset: usize) -> Result<(), ParseError<E>> {
        if self.options.allow_invalid_unicode {
            self.push_scalar(char::REPLACEMENT_CHARACTER, offset)
        } else {
            Err(self.fail(LexicalError::LoneSurrogate(unit), offset))
        }
    }

    fn surrogate_backslash<E>(
        &mut self,
        high: u16,
        chunk: &[u8],
        i: usize,
    ) -> Result<usize, ParseError<E>> {
        if chunk[i] == b'\\' {
            self.lex = Lex::SurrogateU(high);
            return Ok(i + 1);
        }
        self.lone_surrogate::<E>(high, self.base + i)?;
        // The byte is ordinary string content; scan it again.
        self.resume_string(i);
        Ok(i)
    }

    fn surrogate_u<E>(&mut self, high: u16, chunk: &[u8], i: usize) -> Result<usize, ParseError<E>> {
        if chunk[i] == b'u' {
            self.lex = Lex::Unicode(UnicodeEscape::after_high(high));
            return Ok(i + 1);
        }
        self.lone_surrogate::<E>(high, self.base + i)?;
        // The backslash starts an ordinary escape.
        self.lex = Lex::Escape;
        Ok(i)
    }

    fn number<S: Sink + ?Sized>(
        &mut self,
        chunk: &[u8],
        i: usize,
        sink: &mut S,
    ) -> Result<usize, ParseError<S::Error>> {
        let mut j = i;
        while let Some(&b) = chunk.get(j) {
            match self.number.push(b) {
                Step::Continue => j += 1,
                Step::End => {
                    self.end_number(&chunk[self.run_start..j], sink)?;
                    return Ok(j);
                }
                Step::Invalid if b == b'I' && self.number.is_bare_sign() => {
                    self.lex = Lex::Literal {
                        kind: LiteralKind::NegInfinity,
                        matched: 2,
                    };
                    if !self.options.allow_nan {
                        return Err(self.fail(NumericError::NonFiniteNotAllowed, self.token_start));
                    }
                    return Ok(j + 1);
                }
                Step::Invalid => {
                    return Err(self.fail(NumericError::Malformed, self.base + j));
                }
            }
        }
        Ok(j)
    }

    /// Completes the number in progress; `tail` is its text in the current
    /// chunk that has not been copied yet.
    fn end_number<S: Sink + ?Sized>(
        &mut self,
        tail: &[u8],
        sink: &mut S,
    ) -> Result<(), ParseError<S::Error>> {
        let start = self.token_start;
        self.lex = Lex::Idle;
        if self.buffered {
            self.push_bytes::<S::Error>(tail, self.base)?;
        }
        let bytes = if self.buffered {
            self.scratch.as_slice()
        } else {
            tail
        };
        let parsed = core::str::from_utf8(bytes)
            .map_err(|_| NumericError::Malformed)
            .and_then(|text| self.number.finish(text, &self.options));
        let number = match parsed {
            Ok(number) => number,
            Err(e) => return Err(self.fail(e, start)),
        };
        let ctx = self.context(start);
        let result = match number {
            Number::Int(v) => sink.add_int(ctx, v),
            Number::Float(v) => sink.add_float(ctx, v),
            Number::Big(v) => sink.add_big(ctx, v),
        };
        if let Err(e) = result {
            return Err(self.fail(ErrorKind::Sink(e), start));
        }
        self.after_value();
        Ok(())
    }

    fn begin_literal<E>(&mut self, kind: LiteralKind, offset: usize) -> Result<(), ParseError<E>> {
        if matches!(kind, LiteralKind::NaN | LiteralKind::Infinity) && !self.options.allow_nan {
            return Err(self.fail(NumericError::NonFiniteNotAllowed, offset));
        }
        self.token_start = offset;
        self.lex = Lex::Literal { kind, matched: 1 };
        Ok(())
    }

    fn literal<S: Sink + ?Sized>(
        &mut self,
        kind: LiteralKind,
        mut matched: u8,
        chunk: &[u8],
        i: usize,
        sink: &mut S,
    ) -> Result<usize, ParseError<S::Error>> {
        let text = kind.text();
        let mut j = i;
        while let (Some(&b), Some(&want)) = (chunk.get(j), text.get(usize::from(matched))) {
            if b != want {
                let error = LexicalError::UnexpectedByte {
                    byte: b,
                    expected: kind.expected(),
                };
                return Err(self.fail(error, self.base + j));
            }
            matched += 1;
            j += 1;
        }
        if usize::from(matched) < text.len() {
            self.lex = Lex::Literal { kind, matched };
            return Ok(j);
        }
        self.lex = Lex::Idle;
        let start = self.token_start;
        let ctx = self.context(start);
        let result = match kind {
            LiteralKind::True => sink.add_true(ctx),
            LiteralKind::False => sink.add_false(ctx),
            LiteralKind::Null => sink.add_null(ctx),
            LiteralKind::NaN => sink.add_float(ctx, f64::NAN),
            LiteralKind::Infinity => sink.add_float(ctx, f64::INFINITY),
            LiteralKind::NegInfinity => sink.add_float(ctx, f64::NEG_INFINITY),
        };
        if let Err(e) = result {
            return Err(self.fail(ErrorKind::Sink(e), start));
        }
        self.after_value();
        Ok(j)
    }

    fn comment<E>(
        &mut self,
        comment: Comment,
        chunk: &[u8],
        i: usize,
    ) -> Result<usize, ParseError<E>> {
        let b = chunk[i];
        let offset = self.base + i;
        match comment {
            Comment::Start => match b {
                b'/' => self.lex = Lex::Comment(Comment::Line),
                b'*' => self.lex = Lex::Comment(Comment::Block),
                _ => {
                    let error = LexicalError::UnexpectedByte {
                        byte: b,
                        expected: "expected '/' or '*' after '/'",
                    };
                    return Err(self.fail(error, offset));
                }
            },
            Comment::Line => {
                let Some(n) = chunk[i..].iter().position(|&c| c == b'\n') else {
                    return Ok(chunk.len());
                };
                self.newline(offset + n);
                self.lex = Lex::Idle;
                return Ok(i + n + 1);
            }
            Comment::Block | Comment::BlockStar => {
                if b == b'\n' {
                    self.newline(offset);
                }
                self.lex = match (comment, b) {
                    (Comment::BlockStar, b'/') => Lex::Idle,
                    (_, b'*') => Lex::Comment(Comment::BlockStar),
                    _ => Lex::Comment(Comment::Block),
                };
            }
        }
        Ok(i + 1)
    }
}
