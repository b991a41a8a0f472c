#![allow(missing_docs)]
#![allow(clippy::needless_raw_string_hashes)]

use core::fmt::Write;

use jsonstack::{EncodeOptions, EscapeMode, Scanner, encode_to_string, parse};

const DOC: &str = r#"{"name":"café <b>&</b>","path":"a/b","n":[1,-2.5,1e300,123456789012345678901234567890],"empty":{},"list":[]}"#;

fn render(escape: EscapeMode, indent: usize) -> String {
    let value = parse(DOC.as_bytes()).expect("parse error");
    let options = EncodeOptions {
        escape,
        indent,
        ..Default::default()
    };
    encode_to_string(&value, &options).expect("encode error")
}

fn render_tokens(input: &str) -> String {
    let mut out = String::new();
    for token in Scanner::default().scan(input.as_bytes()).expect("scan error") {
        writeln!(out, "{token}").unwrap();
    }
    out
}

#[test]
fn snapshot_escape_modes() {
    insta::assert_snapshot!(render(EscapeMode::Json, 0), @r#"{"name":"café <b>&</b>","path":"a/b","n":[1,-2.5,1e300,123456789012345678901234567890],"empty":{},"list":[]}"#);
    insta::assert_snapshot!(render(EscapeMode::Ascii, 0), @r#"{"name":"caf\u00e9 <b>&</b>","path":"a/b","n":[1,-2.5,1e300,123456789012345678901234567890],"empty":{},"list":[]}"#);
    insta::assert_snapshot!(render(EscapeMode::Slash, 0), @r#"{"name":"café <b>&<\/b>","path":"a\/b","n":[1,-2.5,1e300,123456789012345678901234567890],"empty":{},"list":[]}"#);
    insta::assert_snapshot!(render(EscapeMode::XssSafe, 0), @r#"{"name":"caf\u00e9 \u003cb\u003e\u0026\u003c/b\u003e","path":"a/b","n":[1,-2.5,1e300,123456789012345678901234567890],"empty":{},"list":[]}"#);
    insta::assert_snapshot!(render(EscapeMode::UnicodeXss, 0), @r#"{"name":"café \u003cb\u003e\u0026\u003c/b\u003e","path":"a/b","n":[1,-2.5,1e300,123456789012345678901234567890],"empty":{},"list":[]}"#);
}

#[test]
fn snapshot_pretty() {
    insta::assert_snapshot!(render(EscapeMode::Json, 2), @r#"
    {
      "name": "café <b>&</b>",
      "path": "a/b",
      "n": [
        1,
        -2.5,
        1e300,
        123456789012345678901234567890
      ],
      "empty": {},
      "list": []
    }
    "#);
}

#[test]
fn snapshot_tokens() {
    insta::assert_snapshot!(render_tokens(r#"{"a":[1,2.5,"x"],"b":null}"#), @r#"
    @0 OpenObject
    @5 "a": OpenArray
    @6 Int(1)
    @8 Float(2.5)
    @12 String("x")
    @15 CloseArray
    @21 "b": Null
    @25 CloseObject
    "#);
}
