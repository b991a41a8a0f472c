//! A JSON codec engine: a table-driven resumable scanner, a three-stack value
//! builder, a reference-counted interning cache and an output encoder.
//!
//! ```rust
//! use jsonstack::{EncodeOptions, EscapeMode, encode_to_string, parse};
//!
//! let value = parse(r#"{"name":"café","tags":[1,2.5,123456789012345678901234567890]}"#.as_bytes())
//!     .unwrap();
//! let options = EncodeOptions {
//!     escape: EscapeMode::Ascii,
//!     ..Default::default()
//! };
//! assert_eq!(
//!     encode_to_string(&value, &options).unwrap(),
//!     r#"{"name":"caf\u00e9","tags":[1,2.5,123456789012345678901234567890]}"#
//! );
//! ```
//!
//! Lower layers can be driven directly: [`Scanner`] reports tokens to any
//! [`Sink`], [`ValueBuilder`] is the sink that builds [`Value`] trees, and
//! [`Cache`] / [`SyncCache`] deduplicate keys across documents.

#![allow(missing_docs)]
extern crate alloc;

mod builder;
mod cache;
mod decode;
mod encoder;
mod error;
mod event;
mod hash;
mod number;
mod options;
mod scanner;
mod sink;
mod swar;
mod value;

#[cfg(test)]
mod tests;

pub use builder::{BuildError, KeyBuf, ValueBuilder};
pub use cache::{
    Cache, CacheOptions, CacheStats, DEFAULT_BUCKETS, DEFAULT_FREE_LIST_CAP, DEFAULT_MAX_LEN,
    GROWTH_FACTOR, INLINE_KEY, Interner, NoCache, REHASH_LOAD, SyncCache,
};
pub use decode::{Decoder, parse, parse_with};
pub use encoder::{
    EncodeOptions, Encoder, EscapeMode, FloatFormat, NonFinite, encode, encode_to_string,
};
pub use error::{
    EncodeError, ErrorKind, LexicalError, NumericError, ParseError, ResourceError,
    StructuralError,
};
pub use event::{Event, EventCollector, Token};
pub use hash::murmur64;
pub use number::{BigNumber, Number, NumberAccumulator, parse_number};
pub use options::{
    BuilderOptions, DEFAULT_FLOAT_DIGITS, DEFAULT_MAX_DEPTH, DecimalMode, ParserOptions,
};
pub use scanner::Scanner;
pub use sink::{Container, Context, Sink};
pub use value::{Array, Map, Str, Value};
