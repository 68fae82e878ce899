//! Implements a hashing proxy for membership filters.

use crate::{Error, Filter};
use alloc::vec::Vec;
use core::convert::TryFrom;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Arbitrary key type proxy for membership filters.
///
/// A `HashProxy` exposes a [`Filter`] trait for arbitrary key types, using a
/// `Filter<u64>` as the underlying keystore: every key is hashed down to 64
/// bits with the [`Hasher`] `H` and the hashes are what the filter holds. The
/// collision rate of the proxy therefore depends on the choice of `H` on top
/// of the underlying filter's false positive rate. A `HashProxy` is immutable
/// once constructed.
///
/// Construction is fallible for the same reason the underlying filter's is,
/// and additionally fails when two distinct keys collide into the same 64-bit
/// hash, since the filter then sees duplicates.
///
/// ```
/// # extern crate alloc;
/// # extern crate std;
/// use std::collections::hash_map::DefaultHasher;
/// use binfuse::{BinaryFuse8, Filter, HashProxy};
/// # use alloc::string::String;
/// # use alloc::vec::Vec;
/// # use rand::distributions::Alphanumeric;
/// # use rand::Rng;
///
/// const SAMPLE_SIZE: usize = 10_000;
/// let passwords: Vec<String> = (0..SAMPLE_SIZE)
///     .map(|_| rand::thread_rng().sample_iter(&Alphanumeric).take(30).map(char::from).collect())
///     .collect();
///
/// let pw_filter: HashProxy<String, DefaultHasher, BinaryFuse8> =
///     HashProxy::try_from_keys(&passwords).unwrap();
///
/// for password in passwords {
///     assert!(pw_filter.contains(&password));
/// }
/// ```
///
/// Because of the key type parameter, the existence of a key can only be
/// checked with the types a `HashProxy` was constructed with.
///
/// [`Filter`]: crate::Filter
/// [`Hasher`]: core::hash::Hasher
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HashProxy<T, H, F>
where
    T: Hash,
    H: Hasher + Default,
    F: Filter<u64>,
{
    filter: F,
    _hasher: PhantomData<H>,
    _type: PhantomData<T>,
}

#[inline]
fn hash<T: Hash, H: Hasher + Default>(key: &T) -> u64 {
    let mut hasher = H::default();
    key.hash(&mut hasher);
    hasher.finish()
}

impl<T, H, F> HashProxy<T, H, F>
where
    T: Hash,
    H: Hasher + Default,
    F: Filter<u64> + TryFrom<Vec<u64>, Error = Error>,
{
    /// Hashes `keys` down to 64 bits each and builds the underlying filter
    /// from the hashes.
    ///
    /// # Errors
    ///
    /// Fails when the underlying filter cannot be built, typically because
    /// the keys (or their 64-bit hashes) were not pairwise distinct.
    pub fn try_from_keys(keys: &[T]) -> Result<Self, Error> {
        let hashes: Vec<u64> = keys.iter().map(hash::<T, H>).collect();
        Ok(Self {
            filter: F::try_from(hashes)?,
            _hasher: PhantomData,
            _type: PhantomData,
        })
    }
}

impl<T, H, F> Filter<T> for HashProxy<T, H, F>
where
    T: Hash,
    H: Hasher + Default,
    F: Filter<u64>,
{
    /// Returns `true` if the underlying filter contains the hash of `key`.
    fn contains(&self, key: &T) -> bool {
        self.filter.contains(&hash::<T, H>(key))
    }

    fn len(&self) -> usize {
        self.filter.len()
    }
}

#[cfg(test)]
mod test {
    use crate::{BinaryFuse16, BinaryFuse8, Filter, HashProxy};

    use alloc::vec::Vec;
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    extern crate std;
    use std::collections::hash_map::DefaultHasher;
    use std::string::String;

    #[test]
    fn test_initialization() {
        const SAMPLE_SIZE: usize = 50_000;
        // Key generation is expensive. Do it once and make copies during tests.
        let keys: Vec<String> = (0..SAMPLE_SIZE)
            .map(|_| {
                rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(15)
                    .map(char::from)
                    .collect()
            })
            .collect();

        macro_rules! drive_test {
            ($filter:ident) => {{
                let keys = keys.clone();
                let proxy: HashProxy<_, DefaultHasher, $filter> =
                    HashProxy::try_from_keys(&keys).unwrap();
                for key in keys {
                    assert!(proxy.contains(&key));
                }
            }};
        }

        drive_test!(BinaryFuse8);
        drive_test!(BinaryFuse16);
    }

    #[test]
    fn test_absent_keys_are_mostly_rejected() {
        let keys: Vec<String> = (0..1_000).map(|i| std::format!("member-{}", i)).collect();
        let proxy: HashProxy<String, DefaultHasher, BinaryFuse8> =
            HashProxy::try_from_keys(&keys).unwrap();

        // ~39 of 10000 absent keys are expected to collide at 2^-8.
        let spurious = (0..10_000)
            .map(|i| std::format!("stranger-{}", i))
            .filter(|probe| proxy.contains(probe))
            .count();
        assert!(spurious < 60, "{} absent keys matched", spurious);
    }
}
