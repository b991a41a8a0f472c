//! Three-stack value builder.
//!
//! The builder consumes scanner events through [`Sink`] and keeps three
//! stacks:
//!
//! - `values`: every finished value whose container is still open,
//! - `keys`: the pending object keys, one per value slot of an open object,
//! - `markers`: one [`Marker`] per open container, recording where its
//!   values and keys start.
//!
//! Closing a container slices its region off the value (and key) stack and
//! builds the array or object in one step, instead of inserting element by
//! element into a half-built container.

use alloc::{collections::TryReserveError, vec::Vec};
use core::mem;

use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    cache::{INLINE_KEY, Interner, NoCache},
    error::{LexicalError, ResourceError, StructuralError},
    number::BigNumber,
    options::BuilderOptions,
    sink::{Context, Sink},
    value::{Map, Str, Value},
};

/// Bytes of a pending key; short keys stay inline.
pub type KeyBuf = SmallVec<[u8; INLINE_KEY]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Array,
    Object,
}

impl Kind {
    fn open(self) -> char {
        match self {
            Kind::Array => '[',
            Kind::Object => '{',
        }
    }
}

/// Start of an open container on the value and key stacks.
#[derive(Debug, Clone, Copy)]
struct Marker {
    kind: Kind,
    values: usize,
    keys: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
//  Error type
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Lexical(#[from] LexicalError),
}

impl From<TryReserveError> for BuildError {
    fn from(e: TryReserveError) -> Self {
        Self::Resource(e.into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds [`Value`] trees from scanner events.
///
/// Object keys, and optionally short string values, are formed through the
/// interner `I`; pass a [`Cache`](crate::Cache) or `&SyncCache` to share
/// them between documents.
///
/// # Examples
///
/// ```
/// use jsonstack::{BuilderOptions, Cache, Scanner, ValueBuilder};
///
/// let mut cache = Cache::default();
/// let mut builder = ValueBuilder::with_interner(BuilderOptions::default(), &mut cache);
/// let mut scanner = Scanner::default();
/// scanner.feed(br#"[{"id":1},{"id":2}]"#, &mut builder).unwrap();
/// scanner.finish(&mut builder).unwrap();
/// let value = builder.into_value().unwrap();
/// assert_eq!(value.to_string(), r#"[{"id":1},{"id":2}]"#);
/// assert_eq!(cache.len(), 1);
/// ```
#[derive(Debug)]
pub struct ValueBuilder<I = NoCache> {
    values: Vec<Value>,
    keys: Vec<KeyBuf>,
    markers: Vec<Marker>,
    roots: Vec<Value>,
    interner: I,
    options: BuilderOptions,
}

impl Default for ValueBuilder<NoCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueBuilder<NoCache> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_interner(BuilderOptions::default(), NoCache)
    }
}

impl<I: Interner<Str>> ValueBuilder<I> {
    pub fn with_interner(options: BuilderOptions, interner: I) -> Self {
        Self {
            values: Vec::new(),
            keys: Vec::new(),
            markers: Vec::new(),
            roots: Vec::new(),
            interner,
            options,
        }
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn interner(&self) -> &I {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut I {
        &mut self.interner
    }

    /// Takes the completed top-level values.
    pub fn take_values(&mut self) -> Vec<Value> {
        mem::take(&mut self.roots)
    }

    /// Returns the last completed top-level value.
    ///
    /// # Errors
    ///
    /// Returns [`StructuralError::Truncated`] if a container is still open
    /// or no value was completed.
    pub fn into_value(mut self) -> Result<Value, BuildError> {
        if !self.markers.is_empty() {
            return Err(StructuralError::Truncated.into());
        }
        self.roots
            .pop()
            .ok_or(BuildError::Structural(StructuralError::Truncated))
    }

    /// Drops any partial state, keeping the interner and stack capacity.
    pub fn reset(&mut self) {
        self.values.clear();
        self.keys.clear();
        self.markers.clear();
        self.roots.clear();
    }

    fn form_key(interner: &mut I, options: BuilderOptions, bytes: &[u8]) -> Result<Str, BuildError> {
        let form = |b: &[u8]| {
            core::str::from_utf8(b)
                .map(Str::from)
                .map_err(|_| BuildError::Lexical(LexicalError::InvalidUtf8))
        };
        if options.cache_keys {
            interner.intern(bytes, form)
        } else {
            form(bytes)
        }
    }

    fn form_string(&mut self, s: &str) -> Str {
        if self.options.cache_strings && s.len() <= self.interner.max_len() {
            let Ok(value) = self
                .interner
                .intern(s.as_bytes(), |_| Ok::<_, core::convert::Infallible>(Str::from(s)));
            value
        } else {
            Str::from(s)
        }
    }

    /// Pushes the key of a value that is about to be added to an object.
    fn push_key(&mut self, ctx: &Context<'_>) -> Result<(), BuildError> {
        let Some(top) = self.markers.last() else {
            return Ok(());
        };
        if top.kind == Kind::Object {
            let key = ctx.key.ok_or(StructuralError::MissingKey)?;
            self.keys.try_reserve(1)?;
            self.keys.push(KeyBuf::from_slice(key.as_bytes()));
        }
        Ok(())
    }

    /// Places a finished value: on the value stack inside a container, in
    /// the roots otherwise.
    fn place(&mut self, value: Value) -> Result<(), BuildError> {
        let stack = if self.markers.is_empty() {
            &mut self.roots
        } else {
            &mut self.values
        };
        stack.try_reserve(1)?;
        stack.push(value);
        Ok(())
    }

    fn add(&mut self, ctx: &Context<'_>, value: Value) -> Result<(), BuildError> {
        self.push_key(ctx)?;
        self.place(value)
    }

    fn open(&mut self, ctx: &Context<'_>, kind: Kind) -> Result<(), BuildError> {
        self.push_key(ctx)?;
        self.markers.try_reserve(1)?;
        self.markers.push(Marker {
            kind,
            values: self.values.len(),
            keys: self.keys.len(),
        });
        Ok(())
    }

    fn close(&mut self, kind: Kind) -> Result<(), BuildError> {
        let close = match kind {
            Kind::Array => ']',
            Kind::Object => '}',
        };
        let Some(marker) = self.markers.pop() else {
            return Err(StructuralError::UnmatchedClose(close).into());
        };
        if marker.kind != kind {
            let open = marker.kind.open();
            self.markers.push(marker);
            return Err(StructuralError::MismatchedClose { open, close }.into());
        }

        let value = match kind {
            Kind::Array => Value::Array(self.values.drain(marker.values..).collect()),
            Kind::Object => {
                let values = self.values.drain(marker.values..);
                let keys = self.keys.drain(marker.keys..);
                let mut map = Map::with_capacity(values.len());
                for (key, value) in keys.zip(values) {
                    let key = Self::form_key(&mut self.interner, self.options, &key)?;
                    map.insert(key, value);
                }
                Value::Object(map)
            }
        };
        tracing::trace!(depth = self.markers.len(), ?kind, "container built");
        self.place(value)
    }
}

impl<I: Interner<Str>> Sink for ValueBuilder<I> {
    type Error = BuildError;

    fn add_null(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.add(&ctx, Value::Null)
    }

    fn add_true(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.add(&ctx, Value::Boolean(true))
    }

    fn add_false(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.add(&ctx, Value::Boolean(false))
    }

    fn add_int(&mut self, ctx: Context<'_>, value: i64) -> Result<(), Self::Error> {
        self.add(&ctx, Value::Int(value))
    }

    fn add_float(&mut self, ctx: Context<'_>, value: f64) -> Result<(), Self::Error> {
        self.add(&ctx, Value::Float(value))
    }

    fn add_big(&mut self, ctx: Context<'_>, value: BigNumber) -> Result<(), Self::Error> {
        self.add(&ctx, Value::Big(value))
    }

    fn add_str(&mut self, ctx: Context<'_>, value: &str) -> Result<(), Self::Error> {
        let value = Value::String(self.form_string(value));
        self.add(&ctx, value)
    }

    fn open_array(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.open(&ctx, Kind::Array)
    }

    fn close_array(&mut self, _offset: usize) -> Result<(), Self::Error> {
        self.close(Kind::Array)
    }

    fn open_object(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.open(&ctx, Kind::Object)
    }

    fn close_object(&mut self, _offset: usize) -> Result<(), Self::Error> {
        self.close(Kind::Object)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{sync::Arc, vec};

    use rstest::rstest;

    use super::*;
    use crate::{
        cache::{Cache, CacheOptions},
        sink::Container,
    };

    fn ctx(container: Container, key: Option<&str>) -> Context<'_> {
        Context {
            container,
            key,
            offset: 0,
        }
    }

    fn top() -> Context<'static> {
        ctx(Container::TopLevel, None)
    }

    #[test]
    fn scalar_at_top_level() {
        let mut b = ValueBuilder::new();
        b.add_int(top(), 7).unwrap();
        assert_eq!(b.into_value().unwrap(), Value::Int(7));
    }

    #[test]
    fn nested_build() {
        let mut b = ValueBuilder::new();
        b.open_object(top()).unwrap();
        b.open_array(ctx(Container::Object, Some("xs"))).unwrap();
        b.add_int(ctx(Container::Array, None), 1).unwrap();
        b.add_str(ctx(Container::Array, None), "two").unwrap();
        b.close_array(0).unwrap();
        b.add_null(ctx(Container::Object, Some("n"))).unwrap();
        assert_eq!(b.depth(), 1);
        b.close_object(0).unwrap();

        let v = b.into_value().unwrap();
        let map = v.as_object().unwrap();
        assert_eq!(map.keys().map(|k| &**k).collect::<Vec<_>>(), ["xs", "n"]);
        assert_eq!(
            v.get("xs"),
            Some(&Value::Array(vec![Value::Int(1), Value::from("two")]))
        );
        assert_eq!(v.get("n"), Some(&Value::Null));
    }

    #[test]
    fn duplicate_keys_last_write_wins_in_first_position() {
        let mut b = ValueBuilder::new();
        b.open_object(top()).unwrap();
        b.add_int(ctx(Container::Object, Some("a")), 1).unwrap();
        b.add_int(ctx(Container::Object, Some("b")), 2).unwrap();
        b.add_int(ctx(Container::Object, Some("a")), 3).unwrap();
        b.close_object(0).unwrap();
        let v = b.into_value().unwrap();
        let pairs: Vec<_> = v
            .as_object()
            .unwrap()
            .iter()
            .map(|(k, v)| (&**k, v.as_i64().unwrap()))
            .collect();
        assert_eq!(pairs, [("a", 3), ("b", 2)]);
    }

    #[rstest]
    #[case(Kind::Array, StructuralError::UnmatchedClose(']'))]
    #[case(Kind::Object, StructuralError::UnmatchedClose('}'))]
    fn close_without_open(#[case] kind: Kind, #[case] expected: StructuralError) {
        let mut b = ValueBuilder::new();
        assert_eq!(b.close(kind), Err(BuildError::Structural(expected)));
    }

    #[test]
    fn close_of_wrong_kind() {
        let mut b = ValueBuilder::new();
        b.open_array(top()).unwrap();
        assert_eq!(
            b.close_object(0),
            Err(BuildError::Structural(StructuralError::MismatchedClose {
                open: '[',
                close: '}'
            }))
        );
        assert_eq!(b.depth(), 1);
    }

    #[test]
    fn object_value_without_key() {
        let mut b = ValueBuilder::new();
        b.open_object(top()).unwrap();
        assert_eq!(
            b.add_true(ctx(Container::Object, None)),
            Err(BuildError::Structural(StructuralError::MissingKey))
        );
    }

    #[test]
    fn into_value_requires_closed_containers() {
        let mut b = ValueBuilder::new();
        b.open_array(top()).unwrap();
        assert_eq!(
            b.into_value(),
            Err(BuildError::Structural(StructuralError::Truncated))
        );
        assert_eq!(
            ValueBuilder::new().into_value(),
            Err(BuildError::Structural(StructuralError::Truncated))
        );
    }

    #[test]
    fn take_values_collects_every_root() {
        let mut b = ValueBuilder::new();
        b.add_int(top(), 1).unwrap();
        b.open_array(top()).unwrap();
        b.close_array(0).unwrap();
        assert_eq!(b.take_values(), [Value::Int(1), Value::Array(vec![])]);
        assert!(b.take_values().is_empty());
    }

    #[test]
    fn keys_share_storage_through_the_cache() {
        let mut cache = Cache::new(CacheOptions::default());
        let mut b = ValueBuilder::with_interner(BuilderOptions::default(), &mut cache);
        b.open_array(top()).unwrap();
        for i in 0..2 {
            b.open_object(ctx(Container::Array, None)).unwrap();
            b.add_int(ctx(Container::Object, Some("id")), i).unwrap();
            b.close_object(0).unwrap();
        }
        b.close_array(0).unwrap();
        let v = b.into_value().unwrap();
        let items = v.as_array().unwrap();
        let k0 = items[0].as_object().unwrap().keys().next().unwrap();
        let k1 = items[1].as_object().unwrap().keys().next().unwrap();
        assert!(Arc::ptr_eq(k0, k1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn strings_are_interned_only_when_enabled() {
        let options = BuilderOptions {
            cache_keys: false,
            cache_strings: true,
        };
        let mut cache = Cache::new(CacheOptions::default());
        let mut b = ValueBuilder::with_interner(options, &mut cache);
        b.open_array(top()).unwrap();
        b.add_str(ctx(Container::Array, None), "same").unwrap();
        b.add_str(ctx(Container::Array, None), "same").unwrap();
        b.close_array(0).unwrap();
        let v = b.into_value().unwrap();
        let items = v.as_array().unwrap();
        let (Value::String(a), Value::String(b)) = (&items[0], &items[1]) else {
            panic!("expected strings");
        };
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reset_drops_partial_state() {
        let mut b = ValueBuilder::new();
        b.open_object(top()).unwrap();
        b.add_int(ctx(Container::Object, Some("a")), 1).unwrap();
        b.reset();
        assert_eq!(b.depth(), 0);
        b.add_false(top()).unwrap();
        assert_eq!(b.into_value().unwrap(), Value::Boolean(false));
    }
}
