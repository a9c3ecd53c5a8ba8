//! Deterministic 32-bit state hashing, the acceptance test for replay
//! determinism (spec.md §4.4, §8). Grounded in
//! `original_source/include/exchange/core/utils/HashingUtils.h`: map-shaped
//! state XOR-folds per-entry hashes (order-independent, satisfying the
//! REDESIGN FLAGS' "bag equality" requirement for binary-batch iteration
//! order), vector-shaped state folds with `31 * acc + item` like the C++
//! `StateHashStream`. `crc32fast` supplies the actual digest function in
//! place of `std::hash`, since the exchange-core original relies on a
//! platform hash that Rust has no equivalent of.

use crc32fast::Hasher;

/// Implemented by every piece of durable core state whose replay must be
/// bit-exact across replicas.
pub trait StateHash {
    fn state_hash(&self) -> u32;
}

/// Hashes a sequence of raw bytes with `crc32fast`.
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// XOR-folds the hashes of an iterator of `(key, StateHash)` pairs. Order
/// independent by construction, matching `HashingUtils::StateHash`'s
/// `hash ^= (h1 << 1)` fold over `ankerl::unordered_dense::map` entries.
pub fn xor_fold<K, V>(entries: impl Iterator<Item = (K, V)>) -> u32
where
    K: Into<u64>,
    V: StateHash,
{
    let mut hash: u32 = 0;
    for (key, value) in entries {
        let key_hash = hash_bytes(&key.into().to_be_bytes());
        hash ^= key_hash.rotate_left(1) ^ value.state_hash().rotate_left(2);
    }
    hash
}

/// Folds a sequence of `StateHash` items the way `HashingUtils::
/// StateHashStream` folds a vector: `h = h * 31 + item.state_hash()`.
pub fn stream_fold<'a, T: StateHash + 'a>(items: impl Iterator<Item = &'a T>) -> u32 {
    let mut h: u32 = 0;
    for item in items {
        h = h.wrapping_mul(31).wrapping_add(item.state_hash());
    }
    h
}
