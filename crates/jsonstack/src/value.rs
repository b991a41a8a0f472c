//! JSON value types.
//!
//! This module defines the [`Value`] tree produced by the
//! [`ValueBuilder`](crate::ValueBuilder) and consumed by the
//! [`Encoder`](crate::Encoder).
use alloc::{string::String, sync::Arc, vec::Vec};
use core::fmt;

use indexmap::IndexMap;

use crate::{
    encoder::{EncodeOptions, NonFinite, encode},
    number::{BigNumber, Number},
};

/// Shared string storage for keys and string values; interned strings share
/// one allocation.
pub type Str = Arc<str>;
/// Objects keep their keys in first-insertion order.
pub type Map = IndexMap<Str, Value>;
pub type Array = Vec<Value>;

/// A JSON value as defined by [RFC 8259].
///
/// Numbers keep the representation the scanner chose for them: [`Int`] for
/// integers in `i64` range, [`Float`] for decimals and [`Big`] for literals
/// that did not fit either.
///
/// # Examples
///
/// ```
/// use jsonstack::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("key".into(), Value::from("value"));
/// let v = Value::Object(map);
/// assert_eq!(v.to_string(), r#"{"key":"value"}"#);
/// ```
///
/// [RFC 8259]: https://datatracker.ietf.org/doc/html/rfc8259
/// [`Int`]: Value::Int
/// [`Float`]: Value::Float
/// [`Big`]: Value::Big
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Big(BigNumber),
    String(Str),
    Array(Array),
    Object(Map),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<BigNumber> for Value {
    fn from(v: BigNumber) -> Self {
        Self::Big(v)
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        match v {
            Number::Int(i) => Self::Int(i),
            Number::Float(f) => Self::Float(f),
            Number::Big(b) => Self::Big(b),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v.into())
    }
}

impl From<Str> for Value {
    fn from(v: Str) -> Self {
        Self::String(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Self::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Self::Object(v)
    }
}

impl Value {
    /// Returns `true` if the value is [`Null`].
    ///
    /// [`Null`]: Value::Null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Boolean(..))
    }

    /// Returns `true` for [`Int`], [`Float`] and [`Big`].
    ///
    /// [`Int`]: Value::Int
    /// [`Float`]: Value::Float
    /// [`Big`]: Value::Big
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(..) | Self::Float(..) | Self::Big(..))
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(..))
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(..))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value of any number as `f64`, possibly rounded.
    ///
    /// # Examples
    ///
    /// ```
    /// use jsonstack::Value;
    ///
    /// assert_eq!(Value::Int(3).as_f64(), Some(3.0));
    /// assert_eq!(Value::from("3").as_f64(), None);
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Big(b) => Some(b.to_f64()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up `key` if the value is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object()?.get(key)
    }
}

/// Compact JSON; non-finite floats are written as `NaN`, `Infinity` and
/// `-Infinity`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = EncodeOptions {
            non_finite: NonFinite::Word,
            ..EncodeOptions::default()
        };
        let bytes = encode(self, &options).map_err(|_| fmt::Error)?;
        f.write_str(core::str::from_utf8(&bytes).map_err(|_| fmt::Error)?)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;

    #[test]
    fn accessors() {
        let mut map = Map::new();
        map.insert("n".into(), Value::Int(1));
        let v = Value::Object(map);
        assert_eq!(v.get("n").and_then(Value::as_i64), Some(1));
        assert!(v.get("missing").is_none());
        assert!(Value::Null.get("n").is_none());
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::from(1.5).is_number());
        assert!(Value::from(vec![Value::Null]).is_array());
    }

    #[test]
    fn display_is_compact_json() {
        let v = Value::Array(vec![
            Value::Int(1),
            Value::Float(f64::INFINITY),
            Value::from("a\"b"),
        ]);
        assert_eq!(v.to_string(), r#"[1,Infinity,"a\"b"]"#);
    }
}
