//! Xoshiro256** as pinned by the UR fountain protocol
//!
//! Encoders and decoders must draw the exact same numbers, so the generator,
//! its seeding and the float/int derivations below are part of the wire
//! contract, not tuning knobs.

use crate::sampler::Sampler;
use alloc::vec::Vec;
use sha2::{Digest, Sha256};

/// Deterministic generator selecting the blocks of mixed fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xoshiro256 {
    s: [u64; 4],
}

impl Xoshiro256 {
    /// Seed from arbitrary bytes: SHA-256 of the seed, read as four
    /// big-endian words
    pub fn from_seed_bytes(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut s = [0u64; 4];
        for (word, chunk) in s.iter_mut().zip(digest.chunks_exact(8)) {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            *word = u64::from_be_bytes(buf);
        }
        Self { s }
    }

    /// Next raw 64-bit output
    pub fn next_u64(&mut self) -> u64 {
        let result = self.s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform double in `[0, 1)`
    #[allow(clippy::cast_precision_loss)]
    pub fn next_double(&mut self) -> f64 {
        self.next_u64() as f64 / (u64::MAX as f64 + 1.0)
    }

    /// Uniform integer in `[low, high]`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn next_int(&mut self, low: u64, high: u64) -> u64 {
        (self.next_double() * (high - low + 1) as f64) as u64 + low
    }

    /// Uniform byte
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_byte(&mut self) -> u8 {
        self.next_int(0, 255) as u8
    }

    /// `count` uniform bytes
    pub fn next_data(&mut self, count: usize) -> Vec<u8> {
        (0..count).map(|_| self.next_byte()).collect()
    }

    /// Draw every item without replacement
    #[allow(clippy::cast_possible_truncation)]
    pub fn shuffled<T>(&mut self, mut items: Vec<T>) -> Vec<T> {
        let mut out = Vec::with_capacity(items.len());
        while !items.is_empty() {
            let index = self.next_int(0, (items.len() - 1) as u64) as usize;
            out.push(items.remove(index));
        }
        out
    }

    /// Number of blocks to mix into one fragment, drawn from `1..=count`
    /// with weight `1/degree`
    pub fn choose_degree(&mut self, count: usize) -> usize {
        let weights: Vec<f64> = (1..=count).map(|i| 1.0 / i as f64).collect();
        Sampler::new(&weights).next(self) + 1
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_sequence() {
        let mut rng = Xoshiro256::from_seed_bytes(b"Wolf");
        let got: Vec<u64> = (0..10).map(|_| rng.next_u64() % 100).collect();
        assert_eq!(got, [42, 81, 85, 8, 82, 84, 76, 73, 70, 88]);
    }

    #[test]
    fn test_make_message_prefix() {
        let message = test_utils::make_message("Wolf", 1024);
        assert_eq!(message.len(), 1024);
        assert_eq!(hex::encode(&message[..8]), "916ec65cf77cadf5");
    }

    #[test]
    fn test_shuffled_is_permutation() {
        let mut rng = Xoshiro256::from_seed_bytes(b"shuffle");
        let mut out = rng.shuffled((0..20).collect::<Vec<usize>>());
        out.sort_unstable();
        assert_eq!(out, (0..20).collect::<Vec<usize>>());
    }

    #[test]
    fn test_next_int_bounds() {
        let mut rng = Xoshiro256::from_seed_bytes(b"bounds");
        for _ in 0..1000 {
            let v = rng.next_int(3, 7);
            assert!((3..=7).contains(&v));
        }
    }

    #[test]
    fn test_degree_in_range() {
        let mut rng = Xoshiro256::from_seed_bytes(b"degree");
        for _ in 0..200 {
            let d = rng.choose_degree(11);
            assert!((1..=11).contains(&d));
        }
    }
}
