//! The three-stack builder against a builder that inserts every element into
//! its container as soon as it is seen.

use alloc::{string::String, vec, vec::Vec};
use core::convert::Infallible;

use quickcheck::QuickCheck;

use crate::{
    BigNumber, Context, DecimalMode, EncodeOptions, Map, ParserOptions, Scanner, Sink, Value,
    ValueBuilder, encode,
};

#[derive(Default)]
struct Baseline {
    open: Vec<(Option<String>, Value)>,
    roots: Vec<Value>,
}

impl Baseline {
    fn attach(&mut self, key: Option<&str>, value: Value) -> Result<(), Infallible> {
        match self.open.last_mut() {
            None => self.roots.push(value),
            Some((_, Value::Array(items))) => items.push(value),
            Some((_, Value::Object(map))) => {
                map.insert(key.unwrap().into(), value);
            }
            Some(_) => unreachable!("only containers are open"),
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), Infallible> {
        let (key, value) = self.open.pop().unwrap();
        self.attach(key.as_deref(), value)
    }
}

impl Sink for Baseline {
    type Error = Infallible;

    fn add_null(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.attach(ctx.key, Value::Null)
    }

    fn add_true(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.attach(ctx.key, Value::Boolean(true))
    }

    fn add_false(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.attach(ctx.key, Value::Boolean(false))
    }

    fn add_int(&mut self, ctx: Context<'_>, value: i64) -> Result<(), Self::Error> {
        self.attach(ctx.key, Value::Int(value))
    }

    fn add_float(&mut self, ctx: Context<'_>, value: f64) -> Result<(), Self::Error> {
        self.attach(ctx.key, Value::Float(value))
    }

    fn add_big(&mut self, ctx: Context<'_>, value: BigNumber) -> Result<(), Self::Error> {
        self.attach(ctx.key, Value::Big(value))
    }

    fn add_str(&mut self, ctx: Context<'_>, value: &str) -> Result<(), Self::Error> {
        self.attach(ctx.key, Value::from(value))
    }

    fn open_array(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.open.push((ctx.key.map(String::from), Value::Array(vec![])));
        Ok(())
    }

    fn close_array(&mut self, _offset: usize) -> Result<(), Self::Error> {
        self.close()
    }

    fn open_object(&mut self, ctx: Context<'_>) -> Result<(), Self::Error> {
        self.open.push((ctx.key.map(String::from), Value::Object(Map::new())));
        Ok(())
    }

    fn close_object(&mut self, _offset: usize) -> Result<(), Self::Error> {
        self.close()
    }
}

fn both(src: &[u8]) -> (Vec<Value>, Vec<Value>) {
    let options = ParserOptions {
        decimal_mode: DecimalMode::Float,
        allow_multiple_values: true,
        ..Default::default()
    };
    let mut baseline = Baseline::default();
    let mut scanner = Scanner::new(options);
    scanner.feed(src, &mut baseline).unwrap();
    scanner.finish(&mut baseline).unwrap();

    let mut builder = ValueBuilder::new();
    scanner.feed(src, &mut builder).unwrap();
    scanner.finish(&mut builder).unwrap();

    (baseline.roots, builder.take_values())
}

#[test]
fn bulk_build_matches_baseline_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(value: Value) -> bool {
        let src = encode(&value, &EncodeOptions::default()).unwrap();
        let (baseline, bulk) = both(&src);
        baseline == bulk && bulk == [value]
    }

    QuickCheck::new()
        .tests(2_000)
        .quickcheck(prop as fn(Value) -> bool);
}

#[test]
fn bulk_build_matches_baseline_with_duplicate_keys() {
    let src = br#"{"a":1,"b":{"x":[1,{"a":2,"a":3}],"x":null},"a":[{}]} [[],[[]],{"k":{}}]"#;
    let (baseline, bulk) = both(src);
    assert_eq!(baseline, bulk);
    assert_eq!(bulk.len(), 2);
    let first = &bulk[0];
    let keys: Vec<&str> = first.as_object().unwrap().keys().map(|k| &**k).collect();
    assert_eq!(keys, ["a", "b"]);
    assert_eq!(first.get("b").and_then(|b| b.get("x")), Some(&Value::Null));
}
