//! Stable 32-bit hashing for routing keys
//!
//! Routing uses MurmurHash3 (x86, 32-bit variant) with seed 0 over the UTF-8
//! bytes of the attribute value. The algorithm, seed and encoding are fixed so
//! that a key maps to the same channel across restarts and across versions.

/// Seed used for all routing hashes
pub const ROUTING_SEED: u32 = 0;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// MurmurHash3 x86_32 of `data` with the given seed
#[must_use]
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut blocks = data.chunks_exact(4);
    for block in blocks.by_ref() {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= mix_k(k);
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, &byte) in tail.iter().enumerate() {
            k |= u32::from(byte) << (8 * i);
        }
        h ^= mix_k(k);
    }

    // Length is mixed in modulo 2^32, matching the reference implementation
    h ^= data.len() as u32;
    fmix32(h)
}

#[inline]
fn mix_k(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Routing hash of an attribute value, as a signed 32-bit integer
#[inline]
#[must_use]
pub fn stable_hash32(value: &str) -> i32 {
    murmur3_32(value.as_bytes(), ROUTING_SEED) as i32
}

/// Map a signed hash onto a channel number in `1..=channel_count`
///
/// Uses floor modulo, so negative hashes land in range too.
/// `channel_count` must be non-zero.
#[inline]
#[must_use]
pub fn destination_number(hash: i32, channel_count: u32) -> u32 {
    debug_assert!(channel_count > 0, "channel count must be positive");
    (i64::from(hash).rem_euclid(i64::from(channel_count)) as u32) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"hello", 0), 0x248b_fa47);
        assert_eq!(murmur3_32(b"test", 0), 0xba6b_d213);
        assert_eq!(
            murmur3_32(b"The quick brown fox jumps over the lazy dog", 0),
            0x2e4f_f723
        );
        assert_eq!(murmur3_32(b"Hello, world!", 1234), 0xfaf6_cdb3);
    }

    #[test]
    fn test_tail_lengths() {
        // 1, 2 and 3 byte tails each take a different path through the tail mix
        assert_eq!(murmur3_32(b"a", 0), 0x3c25_69b2);
        assert_eq!(murmur3_32(b"ab", 0), 0x9bbf_d75f);
        assert_eq!(murmur3_32(b"abc", 0), 0xb3dd_93fa);
    }

    #[test]
    fn test_stable_hash_is_signed() {
        assert_eq!(stable_hash32("hello"), 613_153_351);
        assert_eq!(stable_hash32("test"), -1_167_338_989);
        assert_eq!(stable_hash32("Some attribute value"), -1_070_216_312);
    }

    #[test]
    fn test_stable_hash_uses_utf8() {
        let value = "héllo wörld";
        assert_eq!(stable_hash32(value), murmur3_32(value.as_bytes(), 0) as i32);
    }

    #[test]
    fn test_destination_number_floor_mod() {
        assert_eq!(destination_number(0, 1), 1);
        assert_eq!(destination_number(5, 3), 3);
        assert_eq!(destination_number(-1, 3), 3);
        assert_eq!(destination_number(-3, 3), 1);
        assert_eq!(destination_number(-4, 3), 3);
        assert_eq!(destination_number(i32::MIN, 7), (i64::from(i32::MIN).rem_euclid(7) as u32) + 1);
    }

    #[test]
    fn test_destination_number_in_range() {
        for n in 1..=16u32 {
            for hash in [i32::MIN, i32::MIN + 1, -17, -1, 0, 1, 17, i32::MAX - 1, i32::MAX] {
                let d = destination_number(hash, n);
                assert!((1..=n).contains(&d), "hash {hash} n {n} gave {d}");
            }
        }
    }

    #[test]
    fn test_destination_number_large_count() {
        assert_eq!(destination_number(-1, u32::MAX), u32::MAX);
        assert_eq!(destination_number(i32::MAX, u32::MAX), i32::MAX as u32 + 1);
    }
}
