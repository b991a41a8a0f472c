//! Word-at-a-time byte tests over eight bytes packed in a `u64`.

#![allow(clippy::inline_always)]

const LO: u64 = 0x0101_0101_0101_0101;
pub(crate) const HI: u64 = 0x8080_8080_8080_8080;

/// Non-zero if any byte of `word` is below `n` (`n <= 0x80`).
#[inline(always)]
pub(crate) const fn has_less(word: u64, n: u8) -> u64 {
    word.wrapping_sub(LO * n as u64) & !word & HI
}

/// Non-zero if any byte of `word` equals `b`.
#[inline(always)]
pub(crate) const fn has_byte(word: u64, b: u8) -> u64 {
    has_less(word ^ (LO * b as u64), 1)
}

/// Loads eight bytes starting at `i`, if there are that many.
#[inline(always)]
pub(crate) fn load(bytes: &[u8], i: usize) -> Option<u64> {
    let chunk = bytes.get(i..i + 8)?;
    let mut word = [0u8; 8];
    word.copy_from_slice(chunk);
    Some(u64::from_le_bytes(word))
}
