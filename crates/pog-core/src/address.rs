//! Address and address-type primitives shared across the referral graph,
//! the ANV ledger, and both lotteries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 160-bit network address (HASH160 of a pubkey, script, or parameterized
/// script). Wrapped for type safety the same way block heights and amounts
/// are wrapped elsewhere in this domain.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const NULL: Address = Address([0u8; 20]);

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Discriminates the kind of script a referred address resolves to.
///
/// `ParamScriptId` mirrors the original chain's parameterized-scripthash
/// type; its reward eligibility was never fully specified upstream, so it
/// is treated here as permanently ineligible for both ambassador and
/// invite destinations rather than guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressType {
    KeyId = 1,
    ScriptId = 2,
    ParamScriptId = 3,
}

impl AddressType {
    pub fn is_reward_eligible(&self) -> bool {
        !matches!(self, AddressType::ParamScriptId)
    }
}

impl TryFrom<u8> for AddressType {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            1 => Ok(AddressType::KeyId),
            2 => Ok(AddressType::ScriptId),
            3 => Ok(AddressType::ParamScriptId),
            other => Err(other),
        }
    }
}

/// A lookup key for a referral: by hash, by address, or by alias. The
/// referral store accepts any of these for reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferralId {
    Hash([u8; 32]),
    Address(Address),
    Alias(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_address_is_all_zero() {
        assert!(Address::NULL.is_null());
        assert!(!Address::from_bytes([1u8; 20]).is_null());
    }

    #[test]
    fn address_type_round_trips_through_u8() {
        for t in [AddressType::KeyId, AddressType::ScriptId, AddressType::ParamScriptId] {
            let v = t as u8;
            assert_eq!(AddressType::try_from(v), Ok(t));
        }
        assert_eq!(AddressType::try_from(0), Err(0));
    }

    #[test]
    fn param_script_is_never_reward_eligible() {
        assert!(!AddressType::ParamScriptId.is_reward_eligible());
        assert!(AddressType::KeyId.is_reward_eligible());
        assert!(AddressType::ScriptId.is_reward_eligible());
    }
}
