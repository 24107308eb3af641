//! Hash primitives consumed but not implemented from scratch by this
//! crate: HASH256 (double SHA-256), HASH160 (RIPEMD160 of SHA-256), and a
//! keyed 64-bit SipHash used to advance sampling seeds and derive
//! distribution draws. Exposed as a trait so callers can swap in a node's
//! own hashing engine; the default implementation delegates to `bitcoin`
//! and `siphasher`, the same crates already in the dependency stack.

use bitcoin::hashes::{hash160, sha256d, Hash};
use siphasher::sip::SipHasher24;
use std::hash::Hasher as _;

/// The hashing primitives the referral/lottery engine needs from its host.
pub trait Hasher: Send + Sync {
    fn hash256(&self, data: &[u8]) -> [u8; 32];
    fn hash160(&self, data: &[u8]) -> [u8; 20];
    /// Keyed 64-bit hash (SipHash-2-4 equivalent) over arbitrary bytes.
    fn sip_hash(&self, k0: u64, k1: u64, data: &[u8]) -> u64;
}

/// Default implementation grounded on `bitcoin::hashes` (HASH256/HASH160)
/// and `siphasher` (keyed 64-bit hash).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHasher;

impl Hasher for DefaultHasher {
    fn hash256(&self, data: &[u8]) -> [u8; 32] {
        sha256d::Hash::hash(data).to_byte_array()
    }

    fn hash160(&self, data: &[u8]) -> [u8; 20] {
        hash160::Hash::hash(data).to_byte_array()
    }

    fn sip_hash(&self, k0: u64, k1: u64, data: &[u8]) -> u64 {
        let mut hasher = SipHasher24::new_with_keys(k0, k1);
        hasher.write(data);
        hasher.finish()
    }
}
