//! Library implementing binary fuse filters.
//!
//! A binary fuse filter answers "is this key in the set?" for a fixed set of
//! 64-bit keys, with no false negatives and a small false-positive rate. The
//! set cannot be changed after construction. Compared to bloom and cuckoo
//! filters, binary fuse filters are both smaller and faster to query; compared
//! to plain xor filters they store fewer slots per key (~1.13x the key count)
//! and build faster.
//!
//! ```
//! # extern crate alloc;
//! use binfuse::{BinaryFuse8, Filter};
//! use core::convert::TryFrom;
//! # use alloc::vec::Vec;
//!
//! let keys: Vec<u64> = (0..10_000).collect();
//! let filter = BinaryFuse8::try_from(&keys).unwrap();
//!
//! assert!(filter.contains(&1));
//! assert!(filter.contains(&9_999));
//! ```
//!
//! Keys must be pairwise distinct; deduplicate before construction. Arbitrary
//! key types can be filtered through [`HashProxy`].

#![no_std]
// Configuration attributes
#![warn(missing_docs)]
#![forbid(clippy::all, clippy::cargo, clippy::nursery)]

extern crate alloc;

mod bfuse16;
mod bfuse8;
mod construct;
mod geometry;
mod hash_proxy;
mod hashing;

pub use bfuse16::BinaryFuse16;
pub use bfuse8::BinaryFuse8;
pub use hash_proxy::HashProxy;

use core::fmt;

/// Methods common to membership filters.
pub trait Filter<Type> {
    /// Returns `true` if the filter probably contains the specified key.
    ///
    /// There are no false negatives: a key the filter was built from is always
    /// reported present.
    fn contains(&self, key: &Type) -> bool;

    /// Returns the number of fingerprint slots the filter stores.
    fn len(&self) -> usize;

    /// Returns `true` if the filter stores no fingerprints.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Error raised when a filter cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No seed produced a peelable key placement within the attempt budget.
    ///
    /// Random key sets virtually never hit this; input containing duplicate
    /// keys does, because two identical keys collide on all three of their
    /// slots under every seed. Deduplicate and rebuild.
    ConstructionExhausted {
        /// Seeding rounds tried before giving up.
        attempts: u32,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConstructionExhausted { attempts } => write!(
                f,
                "no peelable seeding found in {attempts} attempts; keys are probably not distinct"
            ),
        }
    }
}

impl core::error::Error for Error {}
