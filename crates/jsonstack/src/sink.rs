//! The callback table through which the scanner reports a document.

use crate::number::BigNumber;

/// The kind of container a value sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    TopLevel,
    Array,
    Object,
}

/// Where a value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context<'k> {
    pub container: Container,
    /// The key the value is attached to; set exactly when `container` is
    /// [`Container::Object`].
    pub key: Option<&'k str>,
    /// Byte offset of the first byte of the value.
    pub offset: usize,
}

/// Receives scanner events in document order.
///
/// Value and open callbacks get the [`Context`] of the value; close callbacks
/// get the offset of the closing bracket. Returning an error aborts the parse;
/// the error is surfaced as [`ErrorKind::Sink`](crate::ErrorKind::Sink).
pub trait Sink {
    type Error;

    fn add_null(&mut self, ctx: Context<'_>) -> Result<(), Self::Error>;
    fn add_true(&mut self, ctx: Context<'_>) -> Result<(), Self::Error>;
    fn add_false(&mut self, ctx: Context<'_>) -> Result<(), Self::Error>;
    fn add_int(&mut self, ctx: Context<'_>, value: i64) -> Result<(), Self::Error>;
    fn add_float(&mut self, ctx: Context<'_>, value: f64) -> Result<(), Self::Error>;
    fn add_big(&mut self, ctx: Context<'_>, value: BigNumber) -> Result<(), Self::Error>;
    /// `value` may borrow the scanner's input; copy it to keep it.
    fn add_str(&mut self, ctx: Context<'_>, value: &str) -> Result<(), Self::Error>;
    fn open_array(&mut self, ctx: Context<'_>) -> Result<(), Self::Error>;
    fn close_array(&mut self, offset: usize) -> Result<(), Self::Error>;
    fn open_object(&mut self, ctx: Context<'_>) -> Result<(), Self::Error>;
    fn close_object(&mut self, offset: usize) -> Result<(), Self::Error>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    type Error = S::Error;

    fn add_null(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        (**self).add_null(ctx)
    }

    fn add_true(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        (**self).add_true(ctx)
    }

    fn add_false(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        (**self).add_false(ctx)
    }

    fn add_int(&mut self, ctx: Context<'_>, value: i64) -> Result<(), Self::Error> {
        (**self).add_int(ctx, value)
    }

    fn add_float(&mut self, ctx: Context<'_>, value: f64) -> Result<(), Self::Error> {
        (**self).add_float(ctx, value)
    }

    fn add_big(&mut self, ctx: Context<'_>, value: BigNumber) -> Result<(), Self::Error> {
        (**self).add_big(ctx, value)
    }

    fn add_str(&mut self, ctx: Context<'_>, value: &str) -> Result<(), Self::Error> {
        (**self).add_str(ctx, value)
    }

    fn open_array(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        (**self).open_array(ctx)
    }

    fn close_array(&mut self, offset: usize) -> Result<(), Self::Error> {
        (**self).close_array(offset)
    }

    fn open_object(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        (**self).open_object(ctx)
    }

    fn close_object(&mut self, offset: usize) -> Result<(), Self::Error> {
        (**self).close_object(offset)
    }
}
