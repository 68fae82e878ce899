//! Implements `BinaryFuse16` filters.

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

/// A `BinaryFuse16` is a static membership filter with 16-bit fingerprints
/// laid out in overlapping segments of a [fuse graph]. It trades double the
/// space of a [`BinaryFuse8`] for a much lower false positive rate.
///
/// It uses ≈18 bits per key of the set it is constructed from and has a false
/// positive rate of ≈2^-16 (<0.002%). As with other probabilistic filters, a
/// higher number of keys decreases the bits per key but increases the false
/// positive rate.
///
/// A `BinaryFuse16` is constructed from a set of 64-bit unsigned integers and
/// is immutable. Construction fails only when no table seeding peels, which
/// in practice means the keys were not pairwise distinct.
///
/// ```
/// # extern crate alloc;
/// use binfuse::{BinaryFuse16, Filter};
/// use core::convert::TryFrom;
/// # use alloc::vec::Vec;
/// # use rand::Rng;
///
/// # let mut rng = rand::thread_rng();
/// const SAMPLE_SIZE: usize = 1_000_000;
/// let keys: Vec<u64> = (0..SAMPLE_SIZE).map(|_| rng.gen()).collect();
/// let filter = BinaryFuse16::try_from(&keys).unwrap();
///
/// // no false negatives
/// for key in keys {
///     assert!(filter.contains(&key));
/// }
///
/// // bits per key
/// let bpe = (filter.len() as f64) * 16.0 / (SAMPLE_SIZE as f64);
/// assert!(bpe < 18.1, "Bits per key is {}", bpe);
/// ```
///
/// Serializing and deserializing `BinaryFuse16` filters can be enabled with
/// the [`serde`] feature (or [`bincode`] for bincode).
///
/// [fuse graph]: https://arxiv.org/abs/1907.04749
/// [`BinaryFuse8`]: crate::BinaryFuse8
/// [`serde`]: http://serde.rs
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "bincode", derive(Encode, Decode))]
#[derive(Debug, Clone)]
pub struct BinaryFuse16 {
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
    pub fingerprints: Box<[u16]>,
    /// Seeding rounds construction went through before the table peeled.
    /// Useful when tuning load factors; 1 means the first seed worked.
    pub attempts: u32,
}

impl Filter<u64> for BinaryFuse16 {
    /// Returns `true` if the filter contains the specified key.
    /// Has a false positive rate of <0.002%.
    /// Has no false negatives.
    fn contains(&self, key: &u64) -> bool {
        let hash = mix(*key, self.seed);
        let (h0, h1, h2) = segment_indices(
            hash,
            self.segment_length,
            self.segment_length_mask,
            self.segment_count_length,
        );
        let f = fingerprint(hash) as u16
            ^ self.fingerprints[h0 as usize]
            ^ self.fingerprints[h1 as usize]
            ^ self.fingerprints[h2 as usize];
        f == 0
    }

    fn len(&self) -> usize {
        self.fingerprints.len()
    }
}

impl BinaryFuse16 {
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
        let built = populate::<u16, T>(keys)?;
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

impl TryFrom<&[u64]> for BinaryFuse16 {
    type Error = Error;

    fn try_from(keys: &[u64]) -> Result<Self, Self::Error> {
        Self::try_from_iterator(keys.iter().copied())
    }
}

impl TryFrom<&Vec<u64>> for BinaryFuse16 {
    type Error = Error;

    fn try_from(v: &Vec<u64>) -> Result<Self, Self::Error> {
        Self::try_from_iterator(v.iter().copied())
    }
}

impl TryFrom<Vec<u64>> for BinaryFuse16 {
    type Error = Error;

    fn try_from(v: Vec<u64>) -> Result<Self, Self::Error> {
        Self::try_from_iterator(v.iter().copied())
    }
}
