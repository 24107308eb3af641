//! Referral record construction, address derivation, and basic validation.
//!
//! Grounded on `primitives/referral.{h,cpp}` and `consensus/ref_verify.cpp`.
//! Transaction/script/wallet concerns (real secp256k1 signatures, script
//! templates) are explicit non-goals; `pubkey`/`signature` are carried as
//! opaque byte strings so the graph/ANV/lottery logic this crate is about
//! can be exercised without a full cryptographic stack.

use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressType};
use crate::alias::{self, MAX_ALIAS_LENGTH};
use crate::error::ReferralError;
use crate::hashing::Hasher;

pub const CURRENT_VERSION: u32 = 0;
pub const INVITE_VERSION: u32 = 1;

/// A referral record: the unit that grows the referral forest. Mirrors
/// `Referral`/`MutableReferral` collapsed into one immutable type, since
/// this crate never needs an in-place-mutable builder distinct from the
/// final record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub version: u32,
    pub parent_address: Address,
    pub address_type: AddressType,
    pub pubkey: Vec<u8>,
    pub signature: Vec<u8>,
    pub alias: String,
    address: Address,
    hash: [u8; 32],
}

impl Referral {
    /// Build a referral, deriving its address the way the original chain
    /// does: a type-1 (KeyId) referral's address is the beaconed address
    /// itself; any other type mixes the caller-supplied address with the
    /// HASH160 of the signer pubkey, so the resulting address can't be
    /// claimed by someone who doesn't control `pubkey`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        address_type: AddressType,
        input_address: Address,
        pubkey: Vec<u8>,
        signature: Vec<u8>,
        parent_address: Address,
        alias: String,
        version: u32,
        hasher: &dyn Hasher,
    ) -> Self {
        debug_assert!(alias.len() <= MAX_ALIAS_LENGTH);

        let address = if address_type == AddressType::KeyId {
            input_address
        } else {
            let pubkey_hash = hasher.hash160(&pubkey);
            let mut mixed = Vec::with_capacity(40);
            mixed.extend_from_slice(input_address.as_bytes());
            mixed.extend_from_slice(&pubkey_hash);
            Address::from_bytes(hasher.hash160(&mixed))
        };

        let kept_alias = if version >= INVITE_VERSION { alias } else { String::new() };

        let mut referral = Referral {
            version,
            parent_address,
            address_type,
            pubkey,
            signature,
            alias: kept_alias,
            address,
            hash: [0u8; 32],
        };
        referral.hash = referral.compute_hash(hasher);
        referral
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Canonical byte encoding fed to the hash function. Field order
    /// mirrors `SerializeReferral`.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(self.parent_address.as_bytes());
        buf.push(self.address_type as u8);
        buf.extend_from_slice(self.address.as_bytes());
        buf.extend_from_slice(&self.pubkey);
        buf.extend_from_slice(&self.signature);
        if self.version >= INVITE_VERSION {
            buf.extend_from_slice(self.alias.as_bytes());
        }
        buf
    }

    fn compute_hash(&self, hasher: &dyn Hasher) -> [u8; 32] {
        hasher.hash256(&self.canonical_bytes())
    }
}

/// Basic block-validity gate on a referral, independent of its position in
/// the graph: non-null address, a present pubkey marker, a non-empty
/// signature, and (for versioned referrals) a grammar-valid alias.
/// Grounded on `consensus/ref_verify.cpp::CheckReferral`.
pub fn validate_basic(
    referral: &Referral,
    height: u32,
    safer_alias_blockheight: u32,
) -> Result<(), ReferralError> {
    if referral.address().is_null() {
        return Err(ReferralError::NullAddress);
    }
    if referral.pubkey.is_empty() {
        return Err(ReferralError::InvalidPubkey);
    }
    if referral.signature.is_empty() {
        return Err(ReferralError::MissingSignature);
    }
    if referral.version >= INVITE_VERSION {
        alias::check_alias(&referral.alias, height, safer_alias_blockheight)?;
    }
    Ok(())
}
