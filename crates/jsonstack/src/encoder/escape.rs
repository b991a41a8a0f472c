//! String escaping.
//!
//! Each [`EscapeMode`] owns a table giving the number of output bytes every
//! input byte turns into. Writing a string first sums the table over its
//! bytes to reserve the exact size, then copies plain runs and escapes the
//! rest.

use alloc::vec::Vec;

use crate::swar::{HI, has_byte, has_less, load};

/// Which characters are escaped in encoded strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// `"`, `\` and control characters; other UTF-8 passes through.
    #[default]
    Json,
    /// As `Json`, and every non-ASCII character as `\uXXXX`.
    Ascii,
    /// As `Json`, and `/` as `\/`.
    Slash,
    /// As `Ascii`, and `&`, `<` and `>` as `\u` escapes.
    XssSafe,
    /// As `Json`, and `&`, `<`, `>`, U+2028 and U+2029 as `\u` escapes.
    UnicodeXss,
    /// As `Json`, but line feeds are written raw.
    Newline,
}

const fn json_costs() -> [u8; 256] {
    let mut t = [1u8; 256];
    let mut b = 0;
    while b < 0x20 {
        t[b] = 6;
        b += 1;
    }
    t[0x08] = 2;
    t[b'\t' as usize] = 2;
    t[b'\n' as usize] = 2;
    t[0x0C] = 2;
    t[b'\r' as usize] = 2;
    t[b'"' as usize] = 2;
    t[b'\\' as usize] = 2;
    t
}

/// Charges a whole escaped character to its lead byte.
const fn escape_non_ascii(mut t: [u8; 256]) -> [u8; 256] {
    let mut b = 0x80;
    while b < 0x100 {
        t[b] = match b {
            0x80..=0xBF => 0,
            0xC0..=0xEF => 6,
            _ => 12,
        };
        b += 1;
    }
    t
}

const fn with(mut t: [u8; 256], bytes: &[u8], cost: u8) -> [u8; 256] {
    let mut i = 0;
    while i < bytes.len() {
        t[bytes[i] as usize] = cost;
        i += 1;
    }
    t
}

static JSON: [u8; 256] = json_costs();
static ASCII: [u8; 256] = escape_non_ascii(json_costs());
static SLASH: [u8; 256] = with(json_costs(), b"/", 2);
static XSS_SAFE: [u8; 256] = with(escape_non_ascii(json_costs()), b"&<>", 6);
static UNICODE_XSS: [u8; 256] = with(json_costs(), b"&<>", 6);
static NEWLINE: [u8; 256] = with(json_costs(), b"\n", 1);

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// UTF-8 for U+2028 and U+2029 share these two leading bytes.
const SEPARATOR_PREFIX: [u8; 2] = [0xE2, 0x80];

fn is_separator(rest: &[u8]) -> bool {
    rest.len() >= 3 && rest[..2] == SEPARATOR_PREFIX && matches!(rest[2], 0xA8 | 0xA9)
}

impl EscapeMode {
    fn costs(self) -> &'static [u8; 256] {
        match self {
            EscapeMode::Json => &JSON,
            EscapeMode::Ascii => &ASCII,
            EscapeMode::Slash => &SLASH,
            EscapeMode::XssSafe => &XSS_SAFE,
            EscapeMode::UnicodeXss => &UNICODE_XSS,
            EscapeMode::Newline => &NEWLINE,
        }
    }

    /// Whether none of the eight bytes in `word` needs a look.
    #[inline]
    fn word_is_plain(self, word: u64) -> bool {
        let common = has_byte(word, b'"') | has_byte(word, b'\\') | has_less(word, 0x20);
        let html = || has_byte(word, b'&') | has_byte(word, b'<') | has_byte(word, b'>');
        let extra = match self {
            EscapeMode::Json | EscapeMode::Newline => 0,
            EscapeMode::Ascii => word & HI,
            EscapeMode::Slash => has_byte(word, b'/'),
            EscapeMode::XssSafe => (word & HI) | html(),
            EscapeMode::UnicodeXss => has_byte(word, 0xE2) | html(),
        };
        common | extra == 0
    }

    /// Encoded length of `s`, quotes included.
    #[must_use]
    pub fn escaped_len(self, s: &str) -> usize {
        let costs = self.costs();
        let mut len = 2 + s.bytes().map(|b| usize::from(costs[b as usize])).sum::<usize>();
        if self == EscapeMode::UnicodeXss {
            len += 3 * s.matches(['\u{2028}', '\u{2029}']).count();
        }
        len
    }

    /// Appends `s` as a quoted JSON string.
    pub fn write_str(self, s: &str, out: &mut Vec<u8>) {
        out.reserve(self.escaped_len(s));
        out.push(b'"');
        let costs = self.costs();
        let bytes = s.as_bytes();
        let mut start = 0;
        let mut i = 0;
        while i < bytes.len() {
            if let Some(word) = load(bytes, i) {
                if self.word_is_plain(word) {
                    i += 8;
                    continue;
                }
            }
            let b = bytes[i];
            let special = costs[b as usize] != 1
                || (self == EscapeMode::UnicodeXss && b == 0xE2 && is_separator(&bytes[i..]));
            if !special {
                i += 1;
                continue;
            }
            out.extend_from_slice(&bytes[start..i]);
            i += escape_at(s, i, out);
            start = i;
        }
        out.extend_from_slice(&bytes[start..]);
        out.push(b'"');
    }
}

/// Escapes the character starting at `i`; returns the number of input bytes
/// consumed.
fn escape_at(s: &str, i: usize, out: &mut Vec<u8>) -> usize {
    let b = s.as_bytes()[i];
    let short = match b {
        b'"' => Some(b'"'),
        b'\\' => Some(b'\\'),
        b'/' => Some(b'/'),
        0x08 => Some(b'b'),
        0x0C => Some(b'f'),
        b'\n' => Some(b'n'),
        b'\r' => Some(b'r'),
        b'\t' => Some(b't'),
        _ => None,
    };
    if let Some(c) = short {
        out.extend_from_slice(&[b'\\', c]);
        return 1;
    }
    if b.is_ascii() {
        write_unit(u16::from(b), out);
        return 1;
    }
    let Some(ch) = s.get(i..).and_then(|rest| rest.chars().next()) else {
        out.push(b);
        return 1;
    };
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        write_unit(*unit, out);
    }
    ch.len_utf8()
}

fn write_unit(unit: u16, out: &mut Vec<u8>) {
    let hex = |shift: u16| HEX_DIGITS[usize::from((unit >> shift) & 0xF)];
    out.extend_from_slice(&[b'\\', b'u', hex(12), hex(8), hex(4), hex(0)]);
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use rstest::rstest;

    use super::*;

    fn escaped(mode: EscapeMode, s: &str) -> String {
        let mut out = Vec::new();
        mode.write_str(s, &mut out);
        assert_eq!(out.len(), mode.escaped_len(s), "size pass disagrees for {s:?}");
        String::from_utf8(out).unwrap()
    }

    #[rstest]
    #[case(EscapeMode::Json, "plain", r#""plain""#)]
    #[case(EscapeMode::Json, "a\"b\\c", r#""a\"b\\c""#)]
    #[case(EscapeMode::Json, "\u{8}\u{c}\n\r\t\u{1}", r#""\b\f\n\r\t\u0001""#)]
    #[case(EscapeMode::Json, "caf\u{e9}", "\"caf\u{e9}\"")]
    #[case(EscapeMode::Ascii, "caf\u{e9}", r#""caf\u00e9""#)]
    #[case(EscapeMode::Ascii, "\u{1F600}", r#""\ud83d\ude00""#)]
    #[case(EscapeMode::Slash, "a/b", r#""a\/b""#)]
    #[case(EscapeMode::Json, "a/b", r#""a/b""#)]
    #[case(EscapeMode::XssSafe, "<a href=\"x\">&\u{e9}", r#""\u003ca href=\"x\"\u003e\u0026\u00e9""#)]
    #[case(EscapeMode::UnicodeXss, "<\u{2028}\u{e9}\u{2029}\u{2030}", "\"\\u003c\\u2028\u{e9}\\u2029\u{2030}\"")]
    #[case(EscapeMode::Newline, "a\nb\r", "\"a\nb\\r\"")]
    fn escapes(#[case] mode: EscapeMode, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(escaped(mode, input), expected);
    }

    #[test]
    fn long_plain_runs_use_the_word_path() {
        let input = "abcdefghijklmnopqrstuvwxyz0123456789\"tail";
        assert_eq!(
            escaped(EscapeMode::Json, input),
            "\"abcdefghijklmnopqrstuvwxyz0123456789\\\"tail\""
        );
    }

    #[test]
    fn ascii_escapes_after_a_plain_word() {
        assert_eq!(
            escaped(EscapeMode::Ascii, "abcdefgh\u{e9}ijklmnop\u{e9}"),
            r#""abcdefgh\u00e9ijklmnop\u00e9""#
        );
    }
}
