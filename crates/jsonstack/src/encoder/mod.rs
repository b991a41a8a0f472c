//! Output encoder: walks a [`Value`] and writes JSON text.
//!
//! Strings go through the [`EscapeMode`] cost tables, integers through a
//! two-digit lookup table and floats through [`FloatFormat`]. Output is
//! appended to a caller-owned `Vec<u8>`, which only ever grows.

mod escape;
mod numbers;

use alloc::{string::String, vec::Vec};

pub use escape::EscapeMode;

use crate::{error::EncodeError, options::DEFAULT_MAX_DEPTH, value::Value};

/// What to write for `NaN` and the infinities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonFinite {
    /// Fail with [`EncodeError::NonFiniteFloat`].
    #[default]
    Error,
    /// Write `null`.
    Null,
    /// Write `NaN`, `Infinity` or `-Infinity`, as accepted by the scanner
    /// with [`ParserOptions::allow_nan`](crate::ParserOptions::allow_nan).
    Word,
}

/// How finite floats are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatFormat {
    /// The shortest text that reads back as the same `f64`; scientific
    /// notation below `1e-5` and from `1e16` on.
    #[default]
    Shortest,
    /// A fixed number of digits after the point.
    Fixed(usize),
    /// Scientific notation with a fixed number of digits after the point.
    Scientific(usize),
}

/// Configuration options for the encoder.
///
/// # Examples
///
/// ```rust
/// use jsonstack::{EncodeOptions, EscapeMode, Value, encode};
///
/// let options = EncodeOptions {
///     escape: EscapeMode::Ascii,
///     ..Default::default()
/// };
/// let bytes = encode(&Value::from("\u{e9}"), &options).unwrap();
/// assert_eq!(bytes, br#""\u00e9""#);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub escape: EscapeMode,
    pub float_format: FloatFormat,
    pub non_finite: NonFinite,
    /// Spaces per nesting level; `0` writes compact output.
    pub indent: usize,
    /// Deepest container nesting written; deeper values fail with
    /// [`EncodeError::TooDeep`].
    ///
    /// # Default
    ///
    /// [`DEFAULT_MAX_DEPTH`](crate::DEFAULT_MAX_DEPTH), the scanner's default
    /// limit.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            escape: EscapeMode::default(),
            float_format: FloatFormat::default(),
            non_finite: NonFinite::default(),
            indent: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Encodes `value` into a new buffer.
///
/// # Errors
///
/// Returns [`EncodeError::NonFiniteFloat`] for a non-finite float when
/// `options.non_finite` is [`NonFinite::Error`], and [`EncodeError::TooDeep`]
/// for containers nested deeper than `options.max_depth`.
pub fn encode(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    Encoder::new(*options).write_value(value, &mut out)?;
    Ok(out)
}

/// Encodes `value` into a `String`.
///
/// # Errors
///
/// As [`encode`].
pub fn encode_to_string(value: &Value, options: &EncodeOptions) -> Result<String, EncodeError> {
    let bytes = encode(value, options)?;
    // Keys and strings are valid UTF-8 and escapes are ASCII.
    Ok(String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

/// Writes values into caller-owned buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

impl Encoder {
    #[must_use]
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Appends `value` to `out`.
    ///
    /// # Errors
    ///
    /// As [`encode`]. On error `out` holds a partial document.
    pub fn write_value(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.value(value, 0, out)
    }

    fn value(&self, value: &Value, depth: usize, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match value {
            Value::Null => out.extend_from_slice(b"null"),
            Value::Boolean(true) => out.extend_from_slice(b"true"),
            Value::Boolean(false) => out.extend_from_slice(b"false"),
            Value::Int(i) => numbers::write_i64(out, *i),
            Value::Float(f) => {
                numbers::write_f64(out, *f, self.options.float_format, self.options.non_finite)?;
            }
            Value::Big(b) => out.extend_from_slice(b.as_str().as_bytes()),
            Value::String(s) => self.options.escape.write_str(s, out),
            Value::Array(items) => {
                self.enter(depth)?;
                if items.is_empty() {
                    out.extend_from_slice(b"[]");
                    return Ok(());
                }
                out.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    self.newline(depth + 1, out);
                    self.value(item, depth + 1, out)?;
                }
                self.newline(depth, out);
                out.push(b']');
            }
            Value::Object(map) => {
                self.enter(depth)?;
                if map.is_empty() {
                    out.extend_from_slice(b"{}");
                    return Ok(());
                }
                out.push(b'{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(b',');
                    }
                    self.newline(depth + 1, out);
                    self.options.escape.write_str(key, out);
                    out.push(b':');
                    if self.options.indent > 0 {
                        out.push(b' ');
                    }
                    self.value(item, depth + 1, out)?;
                }
                self.newline(depth, out);
                out.push(b'}');
            }
        }
        Ok(())
    }

    /// Checks that a container at `depth` may be opened.
    fn enter(&self, depth: usize) -> Result<(), EncodeError> {
        if depth >= self.options.max_depth {
            return Err(EncodeError::TooDeep(self.options.max_depth));
        }
        Ok(())
    }

    fn newline(&self, depth: usize, out: &mut Vec<u8>) {
        if self.options.indent == 0 {
            return;
        }
        let width = depth * self.options.indent;
        out.reserve(width + 1);
        out.push(b'\n');
        out.resize(out.len() + width, b' ');
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::{number::BigNumber, value::Map};

    fn sample() -> Value {
        let mut inner = Map::new();
        inner.insert("k".into(), Value::Array(vec![]));
        let mut map = Map::new();
        map.insert("a".into(), Value::Int(-12));
        map.insert(
            "b".into(),
            Value::Array(vec![Value::Float(0.5), Value::Null, Value::Object(inner)]),
        );
        map.insert("c".into(), Value::Object(Map::new()));
        Value::Object(map)
    }

    #[test]
    fn compact() {
        assert_eq!(
            encode_to_string(&sample(), &EncodeOptions::default()).unwrap(),
            r#"{"a":-12,"b":[0.5,null,{"k":[]}],"c":{}}"#
        );
    }

    #[test]
    fn pretty() {
        let options = EncodeOptions {
            indent: 2,
            ..Default::default()
        };
        let expected = "{\n  \"a\": -12,\n  \"b\": [\n    0.5,\n    null,\n    {\n      \"k\": []\n    }\n  ],\n  \"c\": {}\n}";
        assert_eq!(encode_to_string(&sample(), &options).unwrap(), expected);
    }

    #[test]
    fn big_numbers_keep_their_text() {
        let big: BigNumber = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(
            encode(&Value::Big(big), &EncodeOptions::default()).unwrap(),
            b"123456789012345678901234567890"
        );
    }

    #[test]
    fn non_finite_policy_applies_inside_containers() {
        let v = Value::Array(vec![Value::Float(f64::NAN)]);
        assert_eq!(
            encode(&v, &EncodeOptions::default()),
            Err(EncodeError::NonFiniteFloat("NaN"))
        );
        let options = EncodeOptions {
            non_finite: NonFinite::Null,
            ..Default::default()
        };
        assert_eq!(encode_to_string(&v, &options).unwrap(), "[null]");
    }

    /// Wraps `Null` in `levels` arrays without recursing.
    fn nested(levels: usize) -> Value {
        let mut v = Value::Null;
        for _ in 0..levels {
            v = Value::Array(vec![v]);
        }
        v
    }

    #[test]
    fn nesting_up_to_the_limit_is_written() {
        let options = EncodeOptions {
            max_depth: 3,
            ..Default::default()
        };
        assert_eq!(encode_to_string(&nested(3), &options).unwrap(), "[[[null]]]");
        assert_eq!(
            encode(&nested(4), &options),
            Err(EncodeError::TooDeep(3))
        );
    }

    #[test]
    fn deep_values_fail_instead_of_exhausting_the_stack() {
        let v = nested(DEFAULT_MAX_DEPTH + 1);
        assert_eq!(
            encode(&v, &EncodeOptions::default()),
            Err(EncodeError::TooDeep(DEFAULT_MAX_DEPTH))
        );
    }

    #[test]
    fn appends_to_existing_buffer() {
        let mut out = b"prefix ".to_vec();
        Encoder::default()
            .write_value(&Value::from("x"), &mut out)
            .unwrap();
        assert_eq!(out, b"prefix \"x\"");
    }
}
