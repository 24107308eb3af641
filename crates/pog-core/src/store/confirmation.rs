//! Confirmation index: which addresses are "confirmed" (have a positive
//! invite balance), densely indexed so the invite-pool sampler can draw
//! uniformly from them by index. Grounded on
//! `refdb.cpp::UpdateConfirmation`/`ConfirmAllPreDaedalusAddresses`.

use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressType};
use crate::error::{CoreError, InvariantError};

use super::Inner;

/// A confirmed address and its current invite balance, the shape returned
/// by `GetConfirmation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedAddress {
    pub address_type: AddressType,
    pub address: Address,
    pub invites: i64,
}

impl Inner {
    /// Apply a signed delta to an address's invite balance. A brand-new
    /// confirmation is appended to the dense index at
    /// `total_confirmations`; an existing one is updated in place. The one
    /// asymmetry (matching the original exactly): an entry is removed from
    /// the index only when its balance drops to zero *and* it is the last
    /// slot in the index — removing any earlier slot would require
    /// shifting every later index, which block disconnection never does.
    pub fn update_confirmation(
        &mut self,
        address_type: AddressType,
        address: Address,
        amount: i64,
    ) -> Result<i64, CoreError> {
        match self.confirmations.get(&address).copied() {
            None => {
                let idx = self.total_confirmations;
                self.confirmations.insert(address, (idx, amount));
                self.confirmation_by_idx.insert(idx, (address_type, address));
                self.total_confirmations += 1;
                Ok(amount)
            }
            Some((idx, balance)) => {
                let updated = balance + amount;
                if updated == 0 && idx == self.total_confirmations.saturating_sub(1) {
                    self.total_confirmations = self.total_confirmations.saturating_sub(1);
                    self.confirmations.remove(&address);
                    self.confirmation_by_idx.remove(&idx);
                    return Ok(0);
                }
                if updated < 0 {
                    return Err(InvariantError::ConfirmationIndex(address).into());
                }
                self.confirmations.insert(address, (idx, updated));
                Ok(updated)
            }
        }
    }

    pub fn is_confirmed(&self, address: &Address) -> bool {
        self.confirmations.get(address).map(|(_, bal)| *bal > 0).unwrap_or(false)
    }

    pub fn total_confirmations(&self) -> u64 {
        self.total_confirmations
    }

    pub fn confirmation_by_index(&self, idx: u64) -> Option<ConfirmedAddress> {
        let (address_type, address) = *self.confirmation_by_idx.get(&idx)?;
        let (_, invites) = *self.confirmations.get(&address)?;
        Some(ConfirmedAddress { address_type, address, invites })
    }

    pub fn confirmation_of(&self, address: &Address) -> Option<ConfirmedAddress> {
        let (_, invites) = *self.confirmations.get(address)?;
        let referral = self.referrals.get(address)?;
        Some(ConfirmedAddress { address_type: referral.address_type, address: *address, invites })
    }

    /// One-shot, idempotent pass confirming every address that existed
    /// before the "Daedalus" invite-system epoch, processed in ascending
    /// address order for determinism. A no-op if already run.
    pub fn confirm_all_pre_epoch(&mut self) -> Result<(), CoreError> {
        if self.pre_epoch_confirmed {
            return Ok(());
        }

        let mut addresses: Vec<(AddressType, Address)> =
            self.referrals.values().map(|r| (r.address_type, r.address())).collect();
        addresses.sort_by_key(|(_, addr)| *addr);

        tracing::info!(count = addresses.len(), "confirming pre-epoch addresses");
        for (address_type, address) in addresses {
            self.update_confirmation(address_type, address, 1)?;
        }

        self.pre_epoch_confirmed = true;
        Ok(())
    }

    pub fn is_pre_epoch_confirmed(&self) -> bool {
        self.pre_epoch_confirmed
    }

    pub fn set_new_invite_rewarded_height(&mut self, address: Address, height: u32) {
        if height > 0 {
            self.new_invite_rewarded_height.insert(address, height);
        } else {
            self.new_invite_rewarded_height.remove(&address);
        }
    }

    pub fn new_invite_rewarded_height(&self, address: &Address) -> u32 {
        self.new_invite_rewarded_height.get(address).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_confirmation_appends_to_dense_index() {
        let mut inner = Inner::default();
        let a = Address::from_bytes([1u8; 20]);
        inner.update_confirmation(AddressType::KeyId, a, 1).unwrap();
        assert_eq!(inner.total_confirmations(), 1);
        assert!(inner.is_confirmed(&a));
    }

    #[test]
    fn tail_removal_shrinks_index() {
        let mut inner = Inner::default();
        let a = Address::from_bytes([1u8; 20]);
        inner.update_confirmation(AddressType::KeyId, a, 1).unwrap();
        inner.update_confirmation(AddressType::KeyId, a, -1).unwrap();
        assert_eq!(inner.total_confirmations(), 0);
        assert!(!inner.is_confirmed(&a));
    }

    #[test]
    fn non_tail_removal_keeps_slot_but_zeroes_balance() {
        let mut inner = Inner::default();
        let a = Address::from_bytes([1u8; 20]);
        let b = Address::from_bytes([2u8; 20]);
        inner.update_confirmation(AddressType::KeyId, a, 1).unwrap();
        inner.update_confirmation(AddressType::KeyId, b, 1).unwrap();
        // a is not the last slot (b is), so zeroing it keeps its index slot.
        inner.update_confirmation(AddressType::KeyId, a, -1).unwrap();
        assert_eq!(inner.total_confirmations(), 2);
        assert!(!inner.is_confirmed(&a));
        assert!(inner.is_confirmed(&b));
    }

    #[test]
    fn confirm_all_pre_epoch_is_idempotent() {
        let mut inner = Inner::default();
        inner.confirm_all_pre_epoch().unwrap();
        assert!(inner.is_pre_epoch_confirmed());
        // Calling again must not double-confirm or error.
        inner.confirm_all_pre_epoch().unwrap();
        assert_eq!(inner.total_confirmations(), 0);
    }
}
