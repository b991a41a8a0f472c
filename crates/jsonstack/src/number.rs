//! Numeric literal classification and accumulation.
//!
//! The scanner hands every byte of a number literal to a
//! [`NumberAccumulator`], which tracks the sign, a 64-bit mantissa, the number
//! of fraction digits (`shift`) and the exponent while validating the JSON
//! number grammar. When the literal ends, [`NumberAccumulator::finish`]
//! decides between a fixed `i64`, an `f64` and a text-backed [`BigNumber`].
//!
//! Promotion to big is one-directional: once the mantissa overflows the
//! accumulator never goes back to a fixed-width representation for that
//! literal, and the big value is rendered from the literal's original text.

use alloc::boxed::Box;
use core::{fmt, str::FromStr};

use crate::{
    error::NumericError,
    options::{DecimalMode, ParserOptions},
};

/// Exact powers of ten representable as `f64`.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Exponents beyond this are saturated; they already over/underflow `f64`.
const EXPONENT_CAP: i32 = 1_000_000;

/// Most negative exponent for which `10^-e` is still a finite `f64`.
const MIN_FAST_EXPONENT: i32 = -308;

/// A scalar number produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
    Big(BigNumber),
}

/// An arbitrary-precision number backed by its JSON text.
///
/// The text always satisfies the JSON number grammar.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BigNumber(Box<str>);

impl BigNumber {
    pub(crate) fn from_literal(text: &str) -> Self {
        Self(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the literal has neither a fraction nor an exponent.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        !self.0.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
    }

    /// The nearest `f64`, which may be infinite.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Debug for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigNumber({})", self.0)
    }
}

impl fmt::Display for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BigNumber {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut acc = NumberAccumulator::new();
        for &b in s.as_bytes() {
            if acc.push(b) != Step::Continue {
                return Err(NumericError::Malformed);
            }
        }
        if acc.is_complete() {
            Ok(Self::from_literal(s))
        } else {
            Err(NumericError::Malformed)
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for BigNumber {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Start,
    Sign,
    Zero,
    Int,
    Dot,
    Frac,
    ExpMark,
    ExpSign,
    Exp,
}

/// Outcome of feeding one byte to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// The byte belongs to the literal.
    Continue,
    /// The byte does not belong to the literal; the literal ended before it.
    End,
    /// The byte cannot follow what has been seen so far.
    Invalid,
}

/// Mutable scan state of one number literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberAccumulator {
    phase: Phase,
    negative: bool,
    mantissa: u64,
    /// Significant digits, counted from the first non-zero digit.
    digits: u32,
    /// Number of fraction digits.
    shift: u32,
    exp: i32,
    exp_negative: bool,
    /// Set once the mantissa no longer fits in 64 bits.
    big: bool,
}

impl NumberAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if only a `-` has been seen.
    pub(crate) fn is_bare_sign(&self) -> bool {
        self.phase == Phase::Sign
    }

    /// Returns `true` if the bytes seen so far form a complete literal.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(
            self.phase,
            Phase::Zero | Phase::Int | Phase::Frac | Phase::Exp
        )
    }

    /// Returns `true` once the literal has a fraction or an exponent.
    #[must_use]
    pub fn is_decimal(&self) -> bool {
        matches!(
            self.phase,
            Phase::Dot | Phase::Frac | Phase::ExpMark | Phase::ExpSign | Phase::Exp
        )
    }

    /// Returns `true` once the literal has been promoted to big.
    #[must_use]
    pub fn is_big(&self) -> bool {
        self.big
    }

    #[inline]
    fn digit(&mut self, d: u8) {
        if self.digits == 0 && d == 0 {
            return;
        }
        self.digits += 1;
        if self.big {
            return;
        }
        match self
            .mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(u64::from(d)))
        {
            Some(m) => self.mantissa = m,
            None => self.big = true,
        }
    }

    /// Feeds one byte of the literal.
    #[inline]
    pub(crate) fn push(&mut self, b: u8) -> Step {
        let is_digit = b.is_ascii_digit();
        match self.phase {
            Phase::Start => match b {
                b'-' => {
                    self.negative = true;
                    self.phase = Phase::Sign;
                }
                b'0' => self.phase = Phase::Zero,
                b'1'..=b'9' => {
                    self.digit(b - b'0');
                    self.phase = Phase::Int;
                }
                _ => return Step::Invalid,
            },
            Phase::Sign => match b {
                b'0' => self.phase = Phase::Zero,
                b'1'..=b'9' => {
                    self.digit(b - b'0');
                    self.phase = Phase::Int;
                }
                _ => return Step::Invalid,
            },
            Phase::Zero => match b {
                b'.' => self.phase = Phase::Dot,
                b'e' | b'E' => self.phase = Phase::ExpMark,
                _ if is_digit => return Step::Invalid,
                _ => return Step::End,
            },
            Phase::Int => match b {
                _ if is_digit => self.digit(b - b'0'),
                b'.' => self.phase = Phase::Dot,
                b'e' | b'E' => self.phase = Phase::ExpMark,
                _ => return Step::End,
            },
            Phase::Dot | Phase::Frac => match b {
                _ if is_digit => {
                    self.digit(b - b'0');
                    self.shift = self.shift.saturating_add(1);
                    self.phase = Phase::Frac;
                }
                b'e' | b'E' if self.phase == Phase::Frac => self.phase = Phase::ExpMark,
                _ if self.phase == Phase::Dot => return Step::Invalid,
                _ => return Step::End,
            },
            Phase::ExpMark => match b {
                b'+' => self.phase = Phase::ExpSign,
                b'-' => {
                    self.exp_negative = true;
                    self.phase = Phase::ExpSign;
                }
                _ if is_digit => {
                    self.exp_digit(b - b'0');
                    self.phase = Phase::Exp;
                }
                _ => return Step::Invalid,
            },
            Phase::ExpSign | Phase::Exp => match b {
                _ if is_digit => {
                    self.exp_digit(b - b'0');
                    self.phase = Phase::Exp;
                }
                _ if self.phase == Phase::ExpSign => return Step::Invalid,
                _ => return Step::End,
            },
        }
        Step::Continue
    }

    #[inline]
    fn exp_digit(&mut self, d: u8) {
        self.exp = (self.exp * 10 + i32::from(d)).min(EXPONENT_CAP);
    }

    /// Materializes the literal whose complete text is `text`.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::Malformed`] if the literal is incomplete.
    pub fn finish(&self, text: &str, options: &ParserOptions) -> Result<Number, NumericError> {
        if !self.is_complete() {
            return Err(NumericError::Malformed);
        }
        if !self.is_decimal() {
            return Ok(self.finish_integer(text));
        }
        match options.decimal_mode {
            DecimalMode::Big => Ok(Number::Big(BigNumber::from_literal(text))),
            DecimalMode::Auto => {
                if self.big || self.digits > options.float_digits {
                    return Ok(Number::Big(BigNumber::from_literal(text)));
                }
                let f = exact(text)?;
                if f.is_finite() {
                    Ok(Number::Float(f))
                } else {
                    Ok(Number::Big(BigNumber::from_literal(text)))
                }
            }
            DecimalMode::Float => exact(text).map(Number::Float),
            DecimalMode::Fast => match self.fast() {
                Some(f) => Ok(Number::Float(f)),
                None => exact(text).map(Number::Float),
            },
        }
    }

    fn finish_integer(&self, text: &str) -> Number {
        const MIN_MAGNITUDE: u64 = 1 << 63;
        if !self.big {
            if self.negative {
                if self.mantissa == MIN_MAGNITUDE {
                    return Number::Int(i64::MIN);
                }
                if let Ok(m) = i64::try_from(self.mantissa) {
                    return Number::Int(-m);
                }
            } else if let Ok(m) = i64::try_from(self.mantissa) {
                return Number::Int(m);
            }
        }
        Number::Big(BigNumber::from_literal(text))
    }

    /// Mantissa scaled by a power of ten, or `None` when the mantissa
    /// overflowed or `10^-e` is no longer finite.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    fn fast(&self) -> Option<f64> {
        if self.big {
            return None;
        }
        let exp = if self.exp_negative { -self.exp } else { self.exp };
        let shift = self.shift.min(EXPONENT_CAP as u32) as i32;
        let e = exp - shift;
        if e < MIN_FAST_EXPONENT {
            return None;
        }
        let mut v = self.mantissa as f64;
        if e >= 0 {
            v *= pow10(e.unsigned_abs());
        } else {
            v /= pow10(e.unsigned_abs());
        }
        Some(if self.negative { -v } else { v })
    }
}

/// `10^n`, exact from the table up to 22, by squaring beyond.
#[must_use]
pub fn pow10(n: u32) -> f64 {
    if let Some(p) = POW10.get(n as usize) {
        return *p;
    }
    let mut result = 1.0;
    let mut base = 10.0_f64;
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            result *= base;
        }
        base *= base;
        n >>= 1;
    }
    result
}

fn exact(text: &str) -> Result<f64, NumericError> {
    text.parse::<f64>().map_err(|_| NumericError::Malformed)
}

/// Scans a complete literal, as the scanner would.
///
/// # Errors
///
/// Returns [`NumericError::Malformed`] if `text` is not a JSON number.
pub fn parse_number(text: &str, options: &ParserOptions) -> Result<Number, NumericError> {
    let mut acc = NumberAccumulator::new();
    for &b in text.as_bytes() {
        if acc.push(b) != Step::Continue {
            return Err(NumericError::Malformed);
        }
    }
    acc.finish(text, options)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(text: &str) -> Number {
        parse_number(text, &ParserOptions::default()).unwrap()
    }

    fn parse_mode(text: &str, decimal_mode: DecimalMode) -> Number {
        let options = ParserOptions {
            decimal_mode,
            ..ParserOptions::default()
        };
        parse_number(text, &options).unwrap()
    }

    fn big(text: &str) -> Number {
        Number::Big(BigNumber::from_literal(text))
    }

    #[rstest]
    #[case("0", Number::Int(0))]
    #[case("-0", Number::Int(0))]
    #[case("42", Number::Int(42))]
    #[case("-17", Number::Int(-17))]
    #[case("9223372036854775807", Number::Int(i64::MAX))]
    #[case("-9223372036854775808", Number::Int(i64::MIN))]
    #[case("9223372036854775808", big("9223372036854775808"))]
    #[case("-9223372036854775809", big("-9223372036854775809"))]
    #[case("92233720368547758070", big("92233720368547758070"))]
    #[case("123456789012345678901234567890", big("123456789012345678901234567890"))]
    fn integer_boundaries(#[case] text: &str, #[case] expected: Number) {
        assert_eq!(parse(text), expected);
    }

    #[rstest]
    #[case("1.5", 1.5)]
    #[case("-0.25", -0.25)]
    #[case("1e3", 1000.0)]
    #[case("2.5E-3", 0.0025)]
    #[case("0.000001", 0.000_001)]
    #[case("123456789012345", 123_456_789_012_345.0)]
    fn decimals_under_auto(#[case] text: &str, #[case] expected: f64) {
        match parse(text) {
            Number::Float(f) => assert_eq!(f, expected),
            Number::Int(i) => assert_eq!(i as f64, expected),
            other @ Number::Big(_) => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sixteen_significant_digits_promote_under_auto() {
        assert_eq!(parse("0.1234567890123456"), big("0.1234567890123456"));
        assert_eq!(
            parse("0.123456789012345"),
            Number::Float(0.123_456_789_012_345)
        );
    }

    #[test]
    fn leading_zeros_are_not_significant() {
        assert!(matches!(parse("0.000000000000000001"), Number::Float(_)));
    }

    #[test]
    fn float_mode_never_promotes() {
        let text = "0.1234567890123456789";
        assert_eq!(
            parse_mode(text, DecimalMode::Float),
            Number::Float(text.parse().unwrap())
        );
    }

    #[test]
    fn big_mode_always_promotes() {
        assert_eq!(parse_mode("1.5", DecimalMode::Big), big("1.5"));
        // integers are unaffected
        assert_eq!(parse_mode("15", DecimalMode::Big), Number::Int(15));
    }

    #[rstest]
    #[case("1.5")]
    #[case("123.456")]
    #[case("-9.75e2")]
    #[case("4e-3")]
    #[case("1e30")]
    fn fast_mode_is_close_to_exact(#[case] text: &str) {
        let Number::Float(fast) = parse_mode(text, DecimalMode::Fast) else {
            panic!("expected float");
        };
        let exact: f64 = text.parse().unwrap();
        assert!((fast - exact).abs() <= exact.abs() * 1e-15, "{fast} vs {exact}");
    }

    #[test]
    fn fast_mode_falls_back_on_overflowed_mantissa() {
        assert_eq!(
            parse_mode("123456789012345678901234.5", DecimalMode::Fast),
            Number::Float(123_456_789_012_345_678_901_234.5)
        );
    }

    #[rstest]
    #[case("1e-310")]
    #[case("1.5e-320")]
    #[case("2.5e-309")]
    #[case("-4.9e-324")]
    #[case("123456e-315")]
    fn fast_mode_keeps_subnormals(#[case] text: &str) {
        let exact: f64 = text.parse().unwrap();
        assert!(exact != 0.0 && !exact.is_normal());
        assert_eq!(parse_mode(text, DecimalMode::Fast), Number::Float(exact));
    }

    #[test]
    fn fast_mode_underflows_to_zero_like_exact() {
        assert_eq!(parse_mode("1e-400", DecimalMode::Fast), Number::Float(0.0));
    }

    #[test]
    fn auto_promotes_out_of_range_exponents() {
        assert_eq!(parse("1e400"), big("1e400"));
    }

    #[rstest]
    #[case("-")]
    #[case("01")]
    #[case("1.")]
    #[case("1.e5")]
    #[case("1e")]
    #[case("1e+")]
    #[case(".5")]
    #[case("+1")]
    fn malformed_literals(#[case] text: &str) {
        assert_eq!(
            parse_number(text, &ParserOptions::default()),
            Err(NumericError::Malformed)
        );
    }

    #[test]
    fn pow10_beyond_table() {
        assert_eq!(pow10(22), 1e22);
        assert!((pow10(30) - 1e30).abs() / 1e30 < 1e-15);
        assert!(pow10(400).is_infinite());
    }

    #[test]
    fn big_number_from_str_validates() {
        let n: BigNumber = "-12.5e10".parse().unwrap();
        assert_eq!(n.as_str(), "-12.5e10");
        assert!(!n.is_integer());
        assert!("12a".parse::<BigNumber>().is_err());
        assert!("".parse::<BigNumber>().is_err());
        assert!("123".parse::<BigNumber>().unwrap().is_integer());
    }
}
