//! Aggregate Network Value propagation. Grounded on
//! `refdb.cpp::UpdateANV`/`GetANV`/`GetAllANVs`/`GetAllRewardableANVs`: a
//! balance delta at a leaf is added at that address and then halved at
//! every ancestor hop as it bubbles toward genesis, using exact rational
//! arithmetic so no precision is lost to repeated halving.

use crate::address::{Address, AddressType};
use crate::error::{CoreError, InvariantError};
use crate::params::ChainParams;
use crate::rational::Anv;

use super::Inner;

impl Inner {
    /// Apply `change` at `start_address` and half it at every ancestor
    /// hop up to the root. A negative `change` rolls back a previous
    /// application exactly (see `rational::Anv::neg`).
    pub fn update_anv(&mut self, start_address: Address, change: Anv) -> Result<(), CoreError> {
        if change.is_zero() {
            return Ok(());
        }

        let mut current = Some(start_address);
        let mut delta = change;
        let max_levels = self.referrals.len() + 1;
        let mut level = 0;

        while let Some(address) = current {
            if level >= max_levels {
                return Err(InvariantError::CycleDetected(address).into());
            }

            let entry = self
                .anv
                .entry(address)
                .or_insert_with(|| (AddressType::KeyId, Anv::zero()));
            entry.1 = entry.1.clone() + delta.clone();

            tracing::trace!(?address, level, "propagated ANV delta");

            current = self.parent_address(&address);
            level += 1;
            delta = delta.halved();
        }

        Ok(())
    }

    pub fn get_anv(&self, address: &Address) -> Option<(AddressType, Anv)> {
        self.anv.get(address).cloned()
    }

    pub fn get_all_anvs(&self) -> Vec<(AddressType, Address, Anv)> {
        self.anv
            .iter()
            .map(|(addr, (t, anv))| (*t, *addr, anv.clone()))
            .collect()
    }

    /// The subset of lottery-reservoir entrants eligible for ambassador
    /// rewards: key-id/script-id addresses only, and — once the chain has
    /// passed `genesis_exclusion_height` — with the genesis address
    /// filtered out (it is always the single largest ANV holder and would
    /// otherwise dominate every draw).
    pub fn get_all_rewardable_anvs(
        &self,
        params: &ChainParams,
        height: u32,
    ) -> Vec<(AddressType, Address, Anv)> {
        let mut found_genesis = false;
        let mut out = Vec::with_capacity(self.lottery_heap.len());

        for (_, _, address) in &self.lottery_heap {
            let Some((address_type, anv)) = self.get_anv(address) else { continue };

            if !matches!(address_type, AddressType::KeyId | AddressType::ScriptId) {
                continue;
            }

            if !found_genesis && height >= params.genesis_exclusion_height && *address == params.genesis_address {
                found_genesis = true;
                continue;
            }

            out.push((address_type, *address, anv));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referral::Referral;

    fn insert_chain(inner: &mut Inner) -> (Address, Address, Address) {
        let hasher = crate::hashing::DefaultHasher;
        let root = Address::from_bytes([1u8; 20]);
        let mid = Address::from_bytes([2u8; 20]);
        let leaf = Address::from_bytes([3u8; 20]);

        let root_ref = Referral::new(
            AddressType::KeyId,
            root,
            vec![2; 33],
            vec![3; 64],
            Address::NULL,
            String::new(),
            0,
            &hasher,
        );
        inner.insert_referral(root_ref, 0, true).unwrap();

        let mid_ref = Referral::new(
            AddressType::KeyId,
            mid,
            vec![2; 33],
            vec![3; 64],
            root,
            String::new(),
            0,
            &hasher,
        );
        inner.insert_referral(mid_ref, 1, false).unwrap();

        let leaf_ref = Referral::new(
            AddressType::KeyId,
            leaf,
            vec![2; 33],
            vec![3; 64],
            mid,
            String::new(),
            0,
            &hasher,
        );
        inner.insert_referral(leaf_ref, 2, false).unwrap();

        (root, mid, leaf)
    }

    #[test]
    fn delta_halves_at_each_hop() {
        let mut inner = Inner::default();
        let (root, mid, leaf) = insert_chain(&mut inner);

        inner.update_anv(leaf, Anv::from_amount(800)).unwrap();

        assert_eq!(inner.get_anv(&leaf).unwrap().1.to_amount(), 800);
        assert_eq!(inner.get_anv(&mid).unwrap().1.to_amount(), 400);
        assert_eq!(inner.get_anv(&root).unwrap().1.to_amount(), 200);
    }

    #[test]
    fn negated_delta_rolls_back_fully() {
        let mut inner = Inner::default();
        let (root, mid, leaf) = insert_chain(&mut inner);

        inner.update_anv(leaf, Anv::from_amount(800)).unwrap();
        inner.update_anv(leaf, -Anv::from_amount(800)).unwrap();

        assert!(inner.get_anv(&leaf).unwrap().1.is_zero());
        assert!(inner.get_anv(&mid).unwrap().1.is_zero());
        assert!(inner.get_anv(&root).unwrap().1.is_zero());
    }

    #[test]
    fn genesis_excluded_from_rewardable_set_after_height() {
        let mut inner = Inner::default();
        let (root, _mid, leaf) = insert_chain(&mut inner);
        inner.update_anv(leaf, Anv::from_amount(100)).unwrap();
        inner.lottery_heap.push((
            crate::store::lottery::WeightedKey::from_raw(1.0),
            AddressType::KeyId,
            root,
        ));

        let mut params = ChainParams::for_tests();
        params.genesis_address = root;

        let before = inner.get_all_rewardable_anvs(&params, params.genesis_exclusion_height - 1);
        assert_eq!(before.len(), 1);

        let after = inner.get_all_rewardable_anvs(&params, params.genesis_exclusion_height);
        assert!(after.is_empty());
    }
}
