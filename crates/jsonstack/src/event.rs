use alloc::{string::String, vec::Vec};
use core::{convert::Infallible, fmt};

use crate::{
    number::BigNumber,
    sink::{Context, Sink},
};

/// A classified lexical unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Null,
    True,
    False,
    Int(i64),
    /// A decimal materialized as `f64`.
    Float(f64),
    Big(BigNumber),
    String(String),
    OpenArray,
    CloseArray,
    OpenObject,
    CloseObject,
}

/// An [`Event`] with the key it is attached to and the offset of its first
/// byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub event: Event,
    pub key: Option<String>,
    pub offset: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.offset)?;
        if let Some(key) = &self.key {
            write!(f, " {key:?}:")?;
        }
        write!(f, " {:?}", self.event)
    }
}

/// A [`Sink`] that records every event as an owned [`Token`].
#[derive(Debug, Default, Clone)]
pub struct EventCollector {
    pub tokens: Vec<Token>,
}

impl EventCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the tokens collected so far.
    pub fn take(&mut self) -> Vec<Token> {
        core::mem::take(&mut self.tokens)
    }

    fn push(&mut self, ctx: Context<'_>, event: Event) -> Result<(), Infallible> {
        self.tokens.push(Token {
            event,
            key: ctx.key.map(String::from),
            offset: ctx.offset,
        });
        Ok(())
    }

    fn push_close(&mut self, offset: usize, event: Event) -> Result<(), Infallible> {
        self.tokens.push(Token {
            event,
            key: None,
            offset,
        });
        Ok(())
    }
}

impl Sink for EventCollector {
    type Error = Infallible;

    fn add_null(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.push(ctx, Event::Null)
    }

    fn add_true(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.push(ctx, Event::True)
    }

    fn add_false(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.push(ctx, Event::False)
    }

    fn add_int(&mut self, ctx: Context<'_>, value: i64) -> Result<(), Self::Error> {
        self.push(ctx, Event::Int(value))
    }

    fn add_float(&mut self, ctx: Context<'_>, value: f64) -> Result<(), Self::Error> {
        self.push(ctx, Event::Float(value))
    }

    fn add_big(&mut self, ctx: Context<'_>, value: BigNumber) -> Result<(), Self::Error> {
        self.push(ctx, Event::Big(value))
    }

    fn add_str(&mut self, ctx: Context<'_>, value: &str) -> Result<(), Self::Error> {
        self.push(ctx, Event::String(value.into()))
    }

    fn open_array(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.push(ctx, Event::OpenArray)
    }

    fn close_array(&mut self, offset: usize) -> Result<(), Self::Error> {
        self.push_close(offset, Event::CloseArray)
    }

    fn open_object(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.push(ctx, Event::OpenObject)
    }

    fn close_object(&mut self, offset: usize) -> Result<(), Self::Error> {
        self.push_close(offset, Event::CloseObject)
    }
}
