//! Number rendering.

use alloc::vec::Vec;
use core::fmt::{self, Write};

use super::{FloatFormat, NonFinite};
use crate::error::EncodeError;

const fn digit_pairs() -> [u8; 200] {
    let mut t = [0u8; 200];
    let mut i = 0;
    while i < 100 {
        t[2 * i] = b'0' + (i / 10) as u8;
        t[2 * i + 1] = b'0' + (i % 10) as u8;
        i += 1;
    }
    t
}

/// `"00" "01" .. "99"`.
static DIGIT_PAIRS: [u8; 200] = digit_pairs();

/// Shortest output switches to scientific notation outside this range.
const SHORTEST_FIXED: core::ops::Range<f64> = 1e-5..1e16;

/// Writes the decimal digits of `value`, filling a stack buffer from the end
/// two digits at a time.
#[allow(clippy::cast_possible_truncation)]
pub(super) fn write_i64(out: &mut Vec<u8>, value: i64) {
    let mut buf = [0u8; 20];
    let mut pos = buf.len();
    let mut n = value.unsigned_abs();
    while n >= 100 {
        let pair = (n % 100) as usize * 2;
        n /= 100;
        pos -= 2;
        buf[pos..pos + 2].copy_from_slice(&DIGIT_PAIRS[pair..pair + 2]);
    }
    if n >= 10 {
        let pair = n as usize * 2;
        pos -= 2;
        buf[pos..pos + 2].copy_from_slice(&DIGIT_PAIRS[pair..pair + 2]);
    } else {
        pos -= 1;
        buf[pos] = b'0' + n as u8;
    }
    if value < 0 {
        out.push(b'-');
    }
    out.extend_from_slice(&buf[pos..]);
}

struct Bytes<'a>(&'a mut Vec<u8>);

impl Write for Bytes<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

pub(super) fn write_f64(
    out: &mut Vec<u8>,
    value: f64,
    format: FloatFormat,
    non_finite: NonFinite,
) -> Result<(), EncodeError> {
    if !value.is_finite() {
        let word = if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "Infinity"
        } else {
            "-Infinity"
        };
        match non_finite {
            NonFinite::Error => return Err(EncodeError::NonFiniteFloat(word)),
            NonFinite::Null => out.extend_from_slice(b"null"),
            NonFinite::Word => out.extend_from_slice(word.as_bytes()),
        }
        return Ok(());
    }

    match format {
        FloatFormat::Shortest => {
            let abs = value.abs();
            if abs != 0.0 && !SHORTEST_FIXED.contains(&abs) {
                write!(Bytes(&mut *out), "{value:e}")?;
            } else {
                let start = out.len();
                write!(Bytes(&mut *out), "{value}")?;
                // keep it a float when decoded again
                if !out[start..].contains(&b'.') {
                    out.extend_from_slice(b".0");
                }
            }
        }
        FloatFormat::Fixed(precision) => write!(Bytes(&mut *out), "{value:.precision$}")?,
        FloatFormat::Scientific(precision) => write!(Bytes(&mut *out), "{value:.precision$e}")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use rstest::rstest;

    use super::*;

    fn int(v: i64) -> String {
        let mut out = Vec::new();
        write_i64(&mut out, v);
        String::from_utf8(out).unwrap()
    }

    fn float(v: f64, format: FloatFormat, non_finite: NonFinite) -> Result<String, EncodeError> {
        let mut out = Vec::new();
        write_f64(&mut out, v, format, non_finite)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[rstest]
    #[case(0, "0")]
    #[case(7, "7")]
    #[case(42, "42")]
    #[case(-5, "-5")]
    #[case(100, "100")]
    #[case(1_234_567, "1234567")]
    #[case(i64::MAX, "9223372036854775807")]
    #[case(i64::MIN, "-9223372036854775808")]
    fn integers(#[case] value: i64, #[case] expected: &str) {
        assert_eq!(int(value), expected);
    }

    #[rstest]
    #[case(1.5, "1.5")]
    #[case(3.0, "3.0")]
    #[case(-0.0, "-0.0")]
    #[case(0.1, "0.1")]
    #[case(1e-5, "0.00001")]
    #[case(1e-7, "1e-7")]
    #[case(1e16, "1e16")]
    #[case(123_456_789.125, "123456789.125")]
    #[case(1.7976931348623157e308, "1.7976931348623157e308")]
    fn shortest(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(
            float(value, FloatFormat::Shortest, NonFinite::Error).unwrap(),
            expected
        );
    }

    #[test]
    fn fixed_and_scientific() {
        assert_eq!(
            float(1.23456, FloatFormat::Fixed(2), NonFinite::Error).unwrap(),
            "1.23"
        );
        assert_eq!(
            float(1234.56, FloatFormat::Scientific(3), NonFinite::Error).unwrap(),
            "1.235e3"
        );
    }

    #[rstest]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "Infinity")]
    #[case(f64::NEG_INFINITY, "-Infinity")]
    fn non_finite(#[case] value: f64, #[case] word: &'static str) {
        assert_eq!(
            float(value, FloatFormat::Shortest, NonFinite::Error),
            Err(EncodeError::NonFiniteFloat(word))
        );
        assert_eq!(
            float(value, FloatFormat::Shortest, NonFinite::Null).unwrap(),
            "null"
        );
        assert_eq!(
            float(value, FloatFormat::Shortest, NonFinite::Word).unwrap(),
            word
        );
    }
}
