//! String helpers: the plain-run fast path, `\u` escape accumulation and
//! UTF-8 validation of finished strings.

use alloc::{borrow::Cow, string::String};

use super::tables::{HEX, PLAIN, STRING_CLASS};
use crate::{
    error::LexicalError,
    swar::{has_byte, has_less, load},
};

/// Returns the index of the first byte at or after `start` that is not
/// plain string content, or `bytes.len()`.
///
/// Eight bytes are tested per iteration while no quote, backslash or control
/// byte shows up in the word.
#[inline]
pub(super) fn plain_run(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while let Some(word) = load(bytes, i) {
        if has_byte(word, b'"') | has_byte(word, b'\\') | has_less(word, 0x20) != 0 {
            break;
        }
        i += 8;
    }
    while i < bytes.len() && STRING_CLASS[bytes[i] as usize] == PLAIN {
        i += 1;
    }
    i
}

/// Decoder for the body of a `\uXXXX` escape, including the second half of a
/// surrogate pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct UnicodeEscape {
    acc: u16,
    len: u8,
    /// A high surrogate waiting for its low half.
    pub(super) high: Option<u16>,
}

impl UnicodeEscape {
    pub(super) fn after_high(high: u16) -> Self {
        Self {
            acc: 0,
            len: 0,
            high: Some(high),
        }
    }

    /// Feeds one hex digit; returns the code unit once four have been seen.
    #[inline]
    pub(super) fn feed(&mut self, b: u8) -> Result<Option<u16>, LexicalError> {
        let d = HEX[b as usize];
        if d == 0xFF {
            return Err(LexicalError::InvalidUnicodeEscape(b));
        }
        self.acc = (self.acc << 4) | u16::from(d);
        self.len += 1;
        if self.len == 4 {
            Ok(Some(self.acc))
        } else {
            Ok(None)
        }
    }
}

pub(super) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

pub(super) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

pub(super) fn combine_surrogates(high: u16, low: u16) -> char {
    let scalar = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(scalar).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Decodes the bytes of a finished string.
///
/// On failure returns the length of the valid prefix.
pub(super) fn decode(bytes: &[u8], lossy: bool) -> Result<Cow<'_, str>, usize> {
    if lossy {
        Ok(String::from_utf8_lossy(bytes))
    } else {
        core::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| e.valid_up_to())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(b"", 0)]
    #[case(b"abc", 3)]
    #[case(b"abc\"", 3)]
    #[case(b"abcdefghijklmnop\"", 16)]
    #[case(b"abcdefgh\\ijklmnop", 8)]
    #[case(b"abcdefghij\nklmnop", 10)]
    #[case("caf\u{e9} au lait \u{1F600} ok\"".as_bytes(), 21)]
    fn plain_run_stops_at_specials(#[case] input: &[u8], #[case] expected: usize) {
        assert_eq!(plain_run(input, 0), expected);
    }

    #[test]
    fn plain_run_from_offset() {
        assert_eq!(plain_run(b"\"abcdefghijk\"", 1), 12);
    }

    #[test]
    fn unicode_escape_accumulates_four_digits() {
        let mut esc = UnicodeEscape::default();
        assert_eq!(esc.feed(b'0'), Ok(None));
        assert_eq!(esc.feed(b'0'), Ok(None));
        assert_eq!(esc.feed(b'e'), Ok(None));
        assert_eq!(esc.feed(b'9'), Ok(Some(0x00E9)));
    }

    #[test]
    fn unicode_escape_rejects_non_hex() {
        let mut esc = UnicodeEscape::default();
        assert_eq!(esc.feed(b'x'), Err(LexicalError::InvalidUnicodeEscape(b'x')));
    }

    #[test]
    fn surrogates_combine() {
        assert!(is_high_surrogate(0xD83D));
        assert!(is_low_surrogate(0xDE00));
        assert_eq!(combine_surrogates(0xD83D, 0xDE00), '\u{1F600}');
    }

    #[test]
    fn decode_reports_valid_prefix() {
        assert_eq!(decode(b"ab\xFFc", false), Err(2));
        assert_eq!(decode(b"ab\xFFc", true).unwrap(), "ab\u{FFFD}c");
        assert_eq!(decode(b"ok", false).unwrap(), "ok");
    }
}
