//! Hashing collaborators: the key scrambler, the seed stream and the
//! fingerprint extractor.

/// [`MurmurHash3`]'s finalization mix implementation, causing bits to [avalanche].
///
/// [`MurmurHash3`]: https://github.com/spaolacci/murmur3
/// [avalanche]: https://en.wikipedia.org/wiki/Avalanche_effect
///
/// Copyright 2013, Sébastien Paolacci.
/// All rights reserved.
///
/// Redistribution and use in source and binary forms, with or without
/// modification, are permitted provided that the following conditions are met:
///     * Redistributions of source code must retain the above copyright
///       notice, this list of conditions and the following disclaimer.
///     * Redistributions in binary form must reproduce the above copyright
///       notice, this list of conditions and the following disclaimer in the
///       documentation and/or other materials provided with the distribution.
///     * Neither the name of the library nor the
///       names of its contributors may be used to endorse or promote products
///       derived from this software without specific prior written permission.
///
/// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND
/// ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED
/// WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
/// DISCLAIMED. IN NO EVENT SHALL <COPYRIGHT HOLDER> BE LIABLE FOR ANY
/// DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES
/// (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES;
/// LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND
/// ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
/// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
/// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
pub const fn murmur64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.overflowing_mul(0xff51_afd7_ed55_8ccd).0;
    h ^= h >> 33;
    h = h.overflowing_mul(0xc4ce_b9fe_1a85_ec53).0;
    h ^= h >> 33;
    h
}

/// Scrambles a key under the filter seed, resulting in an avalanched hash.
/// Every derived quantity of a key - its three slot indices and its
/// fingerprint - is read off this one hash.
#[inline]
pub const fn mix(key: u64, seed: u64) -> u64 {
    murmur64(key ^ seed)
}

/// Pseudo-RNG using Sebastiano Vigna's [`SplitMix64`] algorithm; produces the
/// seed sequence for construction retries.
///
/// [`SplitMix64`]: http://xoroshiro.di.unimi.it/splitmix64.c
///
/// Written in 2015 by Sebastiano Vigna (vigna@acm.org)
///
/// To the extent possible under law, the author has dedicated all copyright and related and
/// neighboring rights to this software to the public domain worldwide. This software is
/// distributed without any warranty.
///
/// See <http://creativecommons.org/publicdomain/zero/1.0/>.
pub fn splitmix64(seed: &mut u64) -> u64 {
    *seed = (*seed).overflowing_add(0x9e37_79b9_7f4a_7c15).0;
    let mut z = *seed;
    z = (z ^ (z >> 30)).overflowing_mul(0xbf58_476d_1ce4_e5b9).0;
    z = (z ^ (z >> 27)).overflowing_mul(0x94d0_49bb_1331_11eb).0;
    z ^ (z >> 31)
}

/// Folds a scrambled hash down to the value a fingerprint is truncated from.
#[inline]
pub const fn fingerprint(hash: u64) -> u64 {
    hash ^ (hash >> 32)
}
