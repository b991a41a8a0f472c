//! MurmurHash64A, used to place byte strings in cache buckets.

const M: u64 = 0xc6a4_a793_5bd1_e995;
const R: u32 = 47;
const SEED: u64 = 0x1f0d_3804;

/// Hashes `bytes` with MurmurHash64A.
#[must_use]
pub fn murmur64(bytes: &[u8]) -> u64 {
    let len = bytes.len() as u64;
    let mut h = SEED ^ len.wrapping_mul(M);

    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        let mut k = u64::from_le_bytes(word);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        for (i, &b) in tail.iter().enumerate() {
            h ^= u64::from(b) << (8 * i);
        }
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}

#[cfg(test)]
mod tests {
    use super::murmur64;

    #[test]
    fn equal_bytes_hash_equal() {
        assert_eq!(murmur64(b"name"), murmur64(b"name"));
        assert_eq!(murmur64(b""), murmur64(b""));
    }

    #[test]
    fn tail_bytes_contribute() {
        assert_ne!(murmur64(b"abcdefgh1"), murmur64(b"abcdefgh2"));
        assert_ne!(murmur64(b"a"), murmur64(b"b"));
        assert_ne!(murmur64(b"abcdefgh"), murmur64(b"abcdefgi"));
    }

    #[test]
    fn length_is_mixed_in() {
        assert_ne!(murmur64(b"\0"), murmur64(b"\0\0"));
    }
}
