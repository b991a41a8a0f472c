use alloc::{format, string::String, vec::Vec};

use quickcheck::{Arbitrary, Gen};

use crate::{BigNumber, EscapeMode, Map, Value};

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct JsonNumber(f64);

impl Arbitrary for JsonNumber {
    fn arbitrary(g: &mut Gen) -> Self {
        let mut value = f64::arbitrary(g);
        while !value.is_finite() {
            value = f64::arbitrary(g);
        }

        Self(value)
    }
}

/// An integer literal too long for `i64`.
fn big(g: &mut Gen) -> BigNumber {
    let lead = 1 + u8::arbitrary(g) % 9;
    let rest = u64::arbitrary(g) % 10_000_000_000_000_000_000;
    let sign = if bool::arbitrary(g) { "-" } else { "" };
    format!("{sign}{lead}{rest:019}").parse().unwrap()
}

fn scalar(g: &mut Gen) -> Value {
    match usize::arbitrary(g) % 6 {
        0 => Value::Null,
        1 => Value::Boolean(bool::arbitrary(g)),
        2 => Value::Int(i64::arbitrary(g)),
        3 => Value::Float(JsonNumber::arbitrary(g).0),
        4 => Value::Big(big(g)),
        _ => Value::String(String::arbitrary(g).into()),
    }
}

impl Arbitrary for Value {
    fn arbitrary(g: &mut Gen) -> Self {
        fn gen_val(g: &mut Gen, depth: usize) -> Value {
            if depth == 0 {
                return scalar(g);
            }
            match usize::arbitrary(g) % 4 {
                0 | 1 => scalar(g),
                2 => {
                    let len = usize::arbitrary(g) % 4;
                    let items: Vec<Value> = (0..len).map(|_| gen_val(g, depth - 1)).collect();
                    Value::Array(items)
                }
                _ => {
                    let len = usize::arbitrary(g) % 4;
                    let mut map = Map::new();
                    for _ in 0..len {
                        let key = String::arbitrary(g).into();
                        let val = gen_val(g, depth - 1);
                        map.insert(key, val);
                    }
                    Value::Object(map)
                }
            }
        }

        let depth = usize::arbitrary(g) % 4;
        gen_val(g, depth)
    }
}

/// Escape modes whose output is strict JSON; `Newline` writes raw line
/// feeds inside strings.
impl Arbitrary for EscapeMode {
    fn arbitrary(g: &mut Gen) -> Self {
        match usize::arbitrary(g) % 5 {
            0 => EscapeMode::Json,
            1 => EscapeMode::Ascii,
            2 => EscapeMode::Slash,
            3 => EscapeMode::XssSafe,
            _ => EscapeMode::UnicodeXss,
        }
    }
}
