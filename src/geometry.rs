//! Table sizing and the segmented slot geometry.
//!
//! A filter's table is `segment_count + 2` contiguous segments of
//! `segment_length` slots. A key's three slots land in three consecutive
//! segments of that window, which keeps construction cache-friendly and is
//! what lets the table run at a ~1.13 load factor instead of the ~1.23 a
//! plain fuse layout needs.

use libm::{fmax, log, round};

/// Scalar description of a fingerprint table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub segment_length: u32,
    pub segment_length_mask: u32,
    pub segment_count: u32,
    pub segment_count_length: u32,
}

impl Geometry {
    /// Sizes a table for `size` keys, targeting a load factor at which the
    /// first seeding round peels with probability above ~0.8.
    pub fn for_keys(size: u32) -> Self {
        // ln is meaningless below two keys; tiny inputs share the minimum
        // table of three 4-slot segments.
        let ln = log(fmax(size as f64, 2.0));
        let segment_length = (1u32 << (round(0.831 * ln + 0.5) as u32 + 1)).min(1 << 18);
        let size_factor = fmax(1.125, 0.4 + 9.3 / ln);
        let capacity = round(size as f64 * size_factor) as u32;

        let init_segment_count = capacity.div_ceil(segment_length);
        let segment_count = if init_segment_count <= 2 {
            1
        } else {
            init_segment_count - 2
        };

        Geometry {
            segment_length,
            segment_length_mask: segment_length - 1,
            segment_count,
            segment_count_length: segment_count * segment_length,
        }
    }

    /// Total number of fingerprint slots.
    pub fn array_length(&self) -> usize {
        (self.segment_count as usize + 2) * self.segment_length as usize
    }

    /// The three slot indices of a scrambled key hash.
    #[inline]
    pub fn indices(&self, hash: u64) -> (u32, u32, u32) {
        segment_indices(
            hash,
            self.segment_length,
            self.segment_length_mask,
            self.segment_count_length,
        )
    }
}

/// Derives the three slot indices of a key hash. `h0` maps uniformly into the
/// starting segments via the upper half of a 128-bit product; `h1` and `h2`
/// sit one and two segments further with their in-segment offsets perturbed
/// by disjoint windows of the hash. The three always occupy distinct
/// segments, so they are pairwise distinct.
#[inline]
pub(crate) const fn segment_indices(
    hash: u64,
    segment_length: u32,
    segment_length_mask: u32,
    segment_count_length: u32,
) -> (u32, u32, u32) {
    let h0 = ((hash as u128 * segment_count_length as u128) >> 64) as u32;
    let mut h1 = h0 + segment_length;
    let mut h2 = h1 + segment_length;
    h1 ^= ((hash >> 18) as u32) & segment_length_mask;
    h2 ^= (hash as u32) & segment_length_mask;
    (h0, h1, h2)
}

/// Folds a tag sum in `0..6` back into `0..3`.
#[inline]
pub(crate) const fn mod3(x: u8) -> u8 {
    if x > 2 {
        x - 3
    } else {
        x
    }
}
