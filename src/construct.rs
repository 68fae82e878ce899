//! The construction core shared by every fingerprint width.
//!
//! Building a filter means solving a peeling problem: each key is an edge of
//! a 3-uniform hypergraph whose vertices are table slots, and a slot can be
//! solved only while it is the last unsolved slot of some edge. Construction
//! repeatedly extracts such degree-1 slots, stacking the edges it removes;
//! if the stack ends up holding every key, replaying it backwards assigns
//! all fingerprints. A seeding that leaves a 2-core behind is thrown away
//! and retried under the next seed.

use crate::geometry::{mod3, Geometry};
use crate::hashing::{fingerprint, mix, splitmix64};
use crate::Error;
use alloc::boxed::Box;
use alloc::vec;
use core::ops::BitXor;

/// Seeding rounds to attempt before concluding the input cannot peel.
pub(crate) const MAX_ITERATIONS: u32 = 100;

/// A fingerprint cell: the xor-combinable tag stored in each table slot.
pub(crate) trait Fingerprint: Copy + Default + BitXor<Output = Self> + PartialEq {
    /// Truncates a scrambled key hash into a fingerprint.
    fn from_hash(hash: u64) -> Self;

    /// A uniformly random fingerprint, for slots no key ever writes.
    #[cfg(feature = "uniform-random")]
    fn sample<R: rand::Rng>(rng: &mut R) -> Self;
}

impl Fingerprint for u8 {
    #[inline]
    fn from_hash(hash: u64) -> Self {
        fingerprint(hash) as u8
    }

    #[cfg(feature = "uniform-random")]
    fn sample<R: rand::Rng>(rng: &mut R) -> Self {
        rng.gen()
    }
}

impl Fingerprint for u16 {
    #[inline]
    fn from_hash(hash: u64) -> Self {
        fingerprint(hash) as u16
    }

    #[cfg(feature = "uniform-random")]
    fn sample<R: rand::Rng>(rng: &mut R) -> Self {
        rng.gen()
    }
}

/// A successfully built table plus the scalars describing it.
#[derive(Debug)]
pub(crate) struct Populated<Fp> {
    pub seed: u64,
    pub geometry: Geometry,
    pub fingerprints: Box<[Fp]>,
    pub attempts: u32,
}

/// Construction scratch, allocated once per [`populate`] call and reused
/// across seeding rounds.
struct Scratch {
    /// Bucketed key hashes, later overwritten by the peel stack. One slot
    /// longer than the key count: the trailing slot holds a nonzero sentinel
    /// so the partitioning probe cannot run off the end. A stored hash of 0
    /// reads as "empty"; a genuinely zero hash is a 2^-64 event the retry
    /// loop absorbs.
    reverse_order: Box<[u64]>,
    /// Hash position (0, 1 or 2) peeled at each stack depth.
    reverse_h: Box<[u8]>,
    /// Packed per-slot state: incidence count in the upper six bits, xor of
    /// the incident edges' position tags in the low two. A degree-1 slot
    /// thereby knows which position of its surviving edge it is without
    /// scanning anything.
    t2count: Box<[u8]>,
    /// Per-slot xor of all incident key hashes.
    t2hash: Box<[u64]>,
    /// Queue of slots whose degree reached one.
    alone: Box<[u32]>,
    /// Per-block write cursors for the pre-partitioner.
    start_pos: Box<[usize]>,
    block_bits: u32,
}

impl Scratch {
    fn new(size: usize, array_length: usize, segment_count: u32) -> Self {
        // Smallest width covering every starting segment, floored at one bit
        // so the top-bits extraction below never shifts by 64.
        let mut block_bits = 1;
        while (1u32 << block_bits) < segment_count {
            block_bits += 1;
        }

        let mut reverse_order = vec![0u64; size + 1].into_boxed_slice();
        reverse_order[size] = 1;

        Scratch {
            reverse_order,
            reverse_h: vec![0u8; size].into_boxed_slice(),
            t2count: vec![0u8; array_length].into_boxed_slice(),
            t2hash: vec![0u64; array_length].into_boxed_slice(),
            alone: vec![0u32; array_length].into_boxed_slice(),
            start_pos: vec![0usize; 1 << block_bits].into_boxed_slice(),
            block_bits,
        }
    }

    /// Zeroes what a failed round dirtied. The sentinel past the end of
    /// `reverse_order` survives.
    fn reset(&mut self, size: usize) {
        self.reverse_order[..size].fill(0);
        self.t2count.fill(0);
        self.t2hash.fill(0);
    }
}

/// Builds the fingerprint table for `keys`, redrawing seeds until the
/// incidence hypergraph peels completely. The iterator is walked once per
/// seeding round.
pub(crate) fn populate<Fp, T>(keys: T) -> Result<Populated<Fp>, Error>
where
    Fp: Fingerprint,
    T: ExactSizeIterator<Item = u64> + Clone,
{
    let size = keys.len();
    let geometry = Geometry::for_keys(size as u32);
    let array_length = geometry.array_length();

    let mut fingerprints = fingerprint_block::<Fp>(array_length);
    let mut scratch = Scratch::new(size, array_length, geometry.segment_count);

    let mut rng = 1;
    let mut seed = splitmix64(&mut rng);
    for attempt in 1..=MAX_ITERATIONS {
        partition(keys.clone(), seed, size, &mut scratch);
        if accumulate(size, &geometry, &mut scratch) && peel(&geometry, &mut scratch) == size {
            assign(size, &geometry, &scratch, &mut fingerprints);
            return Ok(Populated {
                seed,
                geometry,
                fingerprints,
                attempts: attempt,
            });
        }
        scratch.reset(size);
        seed = splitmix64(&mut rng);
    }

    Err(Error::ConstructionExhausted {
        attempts: MAX_ITERATIONS,
    })
}

/// Scatters scrambled key hashes into `reverse_order`, grouped by the top
/// `block_bits` bits of the hash. Each block owns a proportional slice of the
/// buffer; a block that fills up spills into the next one, and the sentinel
/// bounds the probe on the last slot. Keys adjacent in the buffer then touch
/// nearby `t2count`/`t2hash` entries during [`accumulate`], which is what the
/// whole pass is for.
fn partition<T>(keys: T, seed: u64, size: usize, scratch: &mut Scratch)
where
    T: Iterator<Item = u64>,
{
    let block_bits = scratch.block_bits;
    let block_mask = (1usize << block_bits) - 1;

    for (block, pos) in scratch.start_pos.iter_mut().enumerate() {
        *pos = ((block as u64 * size as u64) >> block_bits) as usize;
    }

    for key in keys {
        let hash = mix(key, seed);
        let mut block = (hash >> (64 - block_bits)) as usize;
        while scratch.reverse_order[scratch.start_pos[block]] != 0 {
            block = (block + 1) & block_mask;
        }
        scratch.reverse_order[scratch.start_pos[block]] = hash;
        scratch.start_pos[block] += 1;
    }
}

/// Accumulates each edge into its three slots: bump the packed degree, fold
/// the position tag into the low bits, xor the hash in. Returns `false` if a
/// slot's 6-bit degree counter wraps (64 edges on one slot), which only a
/// grossly skewed key set can cause; the round is then abandoned rather than
/// corrupted.
fn accumulate(size: usize, geometry: &Geometry, scratch: &mut Scratch) -> bool {
    for i in 0..size {
        let hash = scratch.reverse_order[i];
        let (h0, h1, h2) = geometry.indices(hash);
        for (tag, slot) in [h0, h1, h2].into_iter().enumerate() {
            let slot = slot as usize;
            let count = scratch.t2count[slot].wrapping_add(4) ^ tag as u8;
            scratch.t2count[slot] = count;
            scratch.t2hash[slot] ^= hash;
            if count < 4 {
                return false;
            }
        }
    }
    true
}

/// Extracts degree-1 slots until none remain, recording each removed edge's
/// hash and peeled position on the stack that overwrites `reverse_order`.
/// Returns the stack height; the round succeeded iff it equals the key count.
fn peel(geometry: &Geometry, scratch: &mut Scratch) -> usize {
    let mut queued = 0;
    for (slot, &count) in scratch.t2count.iter().enumerate() {
        if count >> 2 == 1 {
            scratch.alone[queued] = slot as u32;
            queued += 1;
        }
    }

    let mut stack = 0;
    while queued > 0 {
        queued -= 1;
        let slot = scratch.alone[queued] as usize;
        if scratch.t2count[slot] >> 2 != 1 {
            // Stale entry; the slot was drained after being queued.
            continue;
        }

        // Degree one: the xor sums collapse to the surviving edge itself.
        let hash = scratch.t2hash[slot];
        let found = scratch.t2count[slot] & 3;
        scratch.reverse_order[stack] = hash;
        scratch.reverse_h[stack] = found;
        stack += 1;

        let (h0, h1, h2) = geometry.indices(hash);
        let h012 = [h0, h1, h2, h0, h1];
        for offset in 1..3 {
            let other = h012[(found + offset) as usize] as usize;
            if scratch.t2count[other] >> 2 == 2 {
                scratch.alone[queued] = other as u32;
                queued += 1;
            }
            scratch.t2count[other] -= 4;
            scratch.t2count[other] ^= mod3(found + offset);
            scratch.t2hash[other] ^= hash;
        }
    }
    stack
}

/// Replays the peel stack backwards, writing one fingerprint per edge. The
/// peeled slot was the edge's last unsolved one, so its two siblings already
/// hold final values; the write makes the edge's three-way xor equal the
/// key's fingerprint, which is exactly what queries test.
fn assign<Fp: Fingerprint>(
    size: usize,
    geometry: &Geometry,
    scratch: &Scratch,
    fingerprints: &mut [Fp],
) {
    for i in (0..size).rev() {
        let hash = scratch.reverse_order[i];
        let found = scratch.reverse_h[i] as usize;
        let (h0, h1, h2) = geometry.indices(hash);
        let h012 = [h0, h1, h2, h0, h1];
        fingerprints[h012[found] as usize] = Fp::from_hash(hash)
            ^ fingerprints[h012[found + 1] as usize]
            ^ fingerprints[h012[found + 2] as usize];
    }
}

/// Allocates the output table. Under `uniform-random` the slots start out as
/// random fingerprints instead of zeroes: with a zeroed table, every key
/// whose fingerprint happens to be 0 matches any triple of never-assigned
/// slots, which bunches false positives onto those keys.
fn fingerprint_block<Fp: Fingerprint>(len: usize) -> Box<[Fp]> {
    #[cfg(feature = "uniform-random")]
    {
        let mut rng = rand::thread_rng();
        let mut block = alloc::vec::Vec::with_capacity(len);
        block.resize_with(len, || Fp::sample(&mut rng));
        return block.into_boxed_slice();
    }

    #[cfg(not(feature = "uniform-random"))]
    {
        vec![Fp::default(); len].into_boxed_slice()
    }
}
