//! Implements `BinaryFuse8` filters.

use crate::construct::populate;
use crate::geometry::segment_indices;
use crate::hashing::{fingerprint, mix};
use crate::{Error, Filter};
use alloc::{boxed::Box, vec::Vec};
use core::convert::TryFrom;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "bincode")]
use bincode::{Decode, Encode};

/// A `BinaryFuse8` is a static membership filter with 8-bit fingerprints laid
/// out in overlapping segments of a [fuse graph].
///
/// It uses ≈9 bits per key of the set it is constructed from and has a false
/// positive rate of ≈2^-8 (<0.4%). As with other probabilistic filters, a
/// higher number of keys decreases the bits per key but increases the false
/// positive rate.
///
/// A `BinaryFuse8` is constructed from a set of 64-bit unsigned integers and
/// is immutable. Construction fails only when no table seeding peels, which
/// in practice means the keys were not pairwise distinct.
///
/// ```
/// # extern crate alloc;
/// use binfuse::{BinaryFuse8, Filter};
/// use core::convert::TryFrom;
/// # use alloc::vec::Vec;
/// # use rand::Rng;
///
/// # let mut rng = rand::thread_rng();
/// const SAMPLE_SIZE: usize = 1_000_000;
/// let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();
/// let filter = BinaryFuse8::try_from(&keys).unwrap();
///
/// // no false negatives
/// for key in keys {
///     assert!(filter.contains(&key));
/// }
///
/// // bits per key
/// let bpe = (filter.len() as f64) * 8.0 / (SAMPLE_SIZE as f64);
/// assert!(bpe < 9.1, "Bits per key is {}", bpe);
///
/// // false positive rate
/// let false_positives: usize = (0..SAMPLE_SIZE)
///     .map(|_| rng.gen())
///     .filter(|n| filter.contains(n))
///     .count();
/// let fp_rate: f64 = (false_positives * 100) as f64 / SAMPLE_SIZE as f64;
/// assert!(fp_rate < 0.406, "False positive rate is {}", fp_rate);
/// ```
///
/// Serializing and deserializing `BinaryFuse8` filters can be enabled with the
/// [`serde`] feature (or [`bincode`] for bincode).
///
/// [fuse graph]: https://arxiv.org/abs/1907.04749
/// [`serde`]: http://serde.rs
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone)]
pub struct BinaryFuse8 {
    /// The seed fed to the key scrambler.
    pub seed: u64,
    /// Slots per segment; always a power of two.
    pub segment_length: u32,
    /// `segment_length - 1`, masking a hash into a segment offset.
    pub segment_length_mask: u32,
    /// Number of segments a key's first slot can start in.
    pub segment_count: u32,
    /// `segment_count * segment_length`.
    pub segment_count_length: u32,
    /// One fingerprint per slot, `(segment_count + 2) * segment_length` in all.
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub fingerprints: Box<[u8]>,
    /// Seeding rounds construction went through before the table peeled.
    /// Useful when tuning load factors; 1 means the first seed worked.
    pub attempts: u32,
}

impl Filter<u64> for BinaryFuse8 {
    /// Returns `true` if the filter contains the specified key.
    /// Has a false positive rate of <0.4%.
    /// Has no false negatives.
    fn contains(&self, key: &u64) -> bool {
        let hash = mix(*key, self.seed);
        let (h0, h1, h2) = segment_indices(
            hash,
            self.segment_length,
            self.segment_length_mask,
            self.segment_count_length,
        );
        let f = fingerprint(hash) as u8
            ^ self.fingerprints[h0 as usize]
            ^ self.fingerprints[h1 as usize]
            ^ self.fingerprints[h2 as usize];
        f == 0
    }

    fn len(&self) -> usize {
        self.fingerprints.len()
    }
}

impl BinaryFuse8 {
    /// Try to construct the filter from a key iterator. Can be used directly
    /// if you don't have a contiguous array of u64 keys.
    ///
    /// Note: the iterator will be iterated over multiple times while building
    /// the filter. If using a hash function to map the key, it may be cheaper
    /// just to create a scratch array of hashed keys that you pass in.
    pub fn try_from_iterator<T>(keys: T) -> Result<Self, Error>
    where
        T: ExactSizeIterator<Item = u64> + Clone,
    {
        let built = populate::<u8, T>(keys)?;
        Ok(Self {
            seed: built.seed,
            segment_length: built.geometry.segment_length,
            segment_length_mask: built.geometry.segment_length_mask,
            segment_count: built.geometry.segment_count,
            segment_count_length: built.geometry.segment_count_length,
            fingerprints: built.fingerprints,
            attempts: built.attempts,
        })
    }
}

impl TryFrom<&[u64]> for BinaryFuse8 {
    type Error = Error;

    fn try_from(keys: &[u64]) -> Result<Self, Self::Error> {
        Self::try_from_iterator(keys.iter().copied())
    }
}

impl TryFrom<&Vec<u64>> for BinaryFuse8 {
    type Error = Error;

    fn try_from(v: &Vec<u64>) -> Result<Self, Self::Error> {
        Self::try_from_iterator(v.iter().copied())
    }
}

impl TryFrom<Vec<u64>> for BinaryFuse8 {
    type Error = Error;

    fn try_from(v: Vec<u64>) -> Result<Self, Self::Error> {
        Self::try_from_iterator(v.iter().copied())
    }
}

#[cfg(test)]
mod test {
    use crate::{BinaryFuse8, Error, Filter};
    use core::convert::TryFrom;

    use alloc::vec;
    use alloc::vec::Vec;
    use rand::Rng;

    #[test]
    fn test_initialization() {
        const SAMPLE_SIZE: usize = 1_000_000;
        let mut rng = rand::thread_rng();
        let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();

        let filter = BinaryFuse8::try_from(&keys).unwrap();

        for key in keys {
            assert!(filter.contains(&key));
        }
    }

    #[test]
    fn test_bits_per_entry_and_load() {
        const SAMPLE_SIZE: usize = 1_000_000;
        let mut rng = rand::thread_rng();
        let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();

        let filter = BinaryFuse8::try_from(&keys).unwrap();

        let bpe = (filter.len() as f64) * 8.0 / (SAMPLE_SIZE as f64);
        assert!(bpe < 9.1, "Bits per entry is {}", bpe);

        assert!(filter.segment_length.is_power_of_two());
        assert!((1u32 << 12..=1u32 << 18).contains(&filter.segment_length));
        let load = filter.len() as f64 / SAMPLE_SIZE as f64;
        assert!((1.125..=1.30).contains(&load), "load factor is {}", load);
    }

    #[test]
    fn test_false_positives() {
        const SAMPLE_SIZE: usize = 1_000_000;
        let mut rng = rand::thread_rng();
        let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();

        let filter = BinaryFuse8::try_from(&keys).unwrap();

        let false_positives: usize = (0..SAMPLE_SIZE)
            .map(|_| rng.gen())
            .filter(|n| filter.contains(n))
            .count();
        // Expected ~2^-8 of the probes; [0.2%, 0.6%] is many sigma wide.
        assert!(
            (2_000..6_000).contains(&false_positives),
            "{} false positives over {} probes",
            false_positives,
            SAMPLE_SIZE
        );
    }

    #[test]
    fn test_small_set_spurious_probes() {
        let keys: Vec<u64> = (1..=1_000).collect();
        let filter = BinaryFuse8::try_from(&keys).unwrap();

        for key in &keys {
            assert!(filter.contains(key));
        }

        // ~39 of 10000 disjoint probes are expected to collide at 2^-8.
        let spurious = (10_001u64..=20_000).filter(|n| filter.contains(n)).count();
        assert!(spurious < 60, "{} spurious probes matched", spurious);
    }

    #[test]
    fn test_singleton() {
        let filter = BinaryFuse8::try_from(vec![42u64]).unwrap();
        assert!(filter.contains(&42));
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_no_keys() {
        let filter = BinaryFuse8::try_from(Vec::new()).unwrap();
        // Querying an empty filter is allowed; nothing was inserted, so any
        // positive answer is a (tolerated) false positive.
        let _ = filter.contains(&7);
        assert_eq!(filter.attempts, 1);
    }

    #[test]
    fn test_duplicate_keys_error() {
        let result = BinaryFuse8::try_from(vec![7u64; 1_000]);
        assert!(matches!(
            result,
            Err(Error::ConstructionExhausted { attempts: 100 })
        ));
    }

    #[test]
    fn test_attempts_within_budget() {
        const SAMPLE_SIZE: u64 = 1_000_000;
        let keys: Vec<u64> = (0..SAMPLE_SIZE).collect();
        let filter = BinaryFuse8::try_from(&keys).unwrap();
        assert!(
            filter.attempts <= 5,
            "construction took {} seeding rounds",
            filter.attempts
        );
    }

    #[test]
    #[cfg(not(feature = "uniform-random"))]
    fn test_deterministic_construction() {
        let keys: Vec<u64> = (0u64..100_000).map(|i| i * 0x9e37_79b9).collect();

        let a = BinaryFuse8::try_from(&keys).unwrap();
        let b = BinaryFuse8::try_from(&keys).unwrap();

        assert_eq!(a.seed, b.seed);
        assert_eq!(a.attempts, b.attempts);
        assert_eq!(a.fingerprints, b.fingerprints);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_serde_roundtrip() {
        const SAMPLE_SIZE: usize = 100_000;
        let mut rng = rand::thread_rng();
        let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();

        let filter = BinaryFuse8::try_from(&keys).unwrap();

        let config = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(&filter, config).unwrap();
        let (restored, _): (BinaryFuse8, usize) =
            bincode::serde::decode_from_slice(&bytes, config).unwrap();

        assert_eq!(restored.seed, filter.seed);
        assert_eq!(restored.fingerprints, filter.fingerprints);
        for key in keys {
            assert!(restored.contains(&key));
        }
    }
}
