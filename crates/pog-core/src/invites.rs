//! Invite-pool sampling: draws confirmed addresses to receive invites from
//! three pools — CGS-weighted, "new" (never rewarded from this pool
//! before), and uniform-any — each with its own draw probability, and a
//! battery of rejection rules. Grounded on `pog3/select.cpp`'s
//! `SelectInviteAddresses`/`GetConfirmedAddressesForNewPool`/
//! `SelectInviteAddressFrom{Cgs,New,Any}Pool`.

use std::collections::HashSet;

use crate::address::{Address, AddressType};
use crate::hashing::Hasher;
use crate::params::InvitePoolWeights;
use crate::selector::{rehash, rehash_with_address, CgsDistribution};
use crate::store::{ConfirmedAddress, Inner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
    Cgs,
    New,
    Any,
}

/// Only KeyId addresses may receive invites (a stricter rule than the
/// ambassador lottery's KeyId-or-ScriptId).
fn is_valid_invite_destination(address_type: AddressType) -> bool {
    matches!(address_type, AddressType::KeyId)
}

pub struct InvitePoolSampler<'a> {
    store: &'a Inner,
    hasher: &'a dyn Hasher,
}

impl<'a> InvitePoolSampler<'a> {
    pub fn new(store: &'a Inner, hasher: &'a dyn Hasher) -> Self {
        Self { store, hasher }
    }

    /// Confirmed addresses eligible for the NEW pool: at most one
    /// outstanding invite, never rewarded from this pool before.
    fn confirmed_addresses_for_new_pool(&self) -> Vec<ConfirmedAddress> {
        let total = self.store.total_confirmations();
        let mut out = Vec::new();
        for idx in 0..total {
            let Some(c) = self.store.confirmation_by_index(idx) else { continue };
            if c.invites > 1 || !is_valid_invite_destination(c.address_type) {
                continue;
            }
            if self.store.new_invite_rewarded_height(&c.address) > 0 {
                continue;
            }
            out.push(c);
        }
        out
    }

    fn sample_from_new_pool(&self, pool: &mut Vec<ConfirmedAddress>, seed: &[u8; 32]) -> Option<ConfirmedAddress> {
        if pool.is_empty() {
            return None;
        }
        let idx = (self.hasher.sip_hash(0, 0, seed) as usize) % pool.len();
        let last = pool.len() - 1;
        pool.swap(idx, last);
        pool.pop()
    }

    fn sample_from_cgs_pool(&self, distribution: &CgsDistribution, seed: &[u8; 32]) -> Option<ConfirmedAddress> {
        let entrant = distribution.sample(seed, self.hasher)?;
        self.store.confirmation_of(&entrant.address)
    }

    fn sample_from_any_pool(&self, seed: &[u8; 32]) -> Option<ConfirmedAddress> {
        let total = self.store.total_confirmations();
        if total == 0 {
            return None;
        }
        let idx = self.hasher.sip_hash(0, 0, seed) % total;
        self.store.confirmation_by_index(idx)
    }

    /// Draw up to `n` invite recipients. Returns `(selected, selected_from_new_pool)`:
    /// the latter is reported separately so a caller can mark those addresses'
    /// `new_invite_rewarded_height`, matching the upstream split return.
    #[allow(clippy::too_many_arguments)]
    pub fn select_invite_addresses(
        &self,
        distribution: &CgsDistribution,
        mut seed: [u8; 32],
        genesis_address: Address,
        n: usize,
        unconfirmed_invites: &HashSet<Address>,
        max_outstanding_invites: i64,
        weights: InvitePoolWeights,
    ) -> (Vec<ConfirmedAddress>, Vec<ConfirmedAddress>) {
        if n == 0 {
            return (Vec::new(), Vec::new());
        }

        let total = self.store.total_confirmations();
        if total == 0 {
            return (Vec::new(), Vec::new());
        }

        let mut max_tries = (n as u64).max(total / 10).min(total);
        let mut new_pool = self.confirmed_addresses_for_new_pool();

        let mut selected = Vec::new();
        let mut selected_new = Vec::new();
        let mut remaining = n;

        while remaining > 0 && max_tries > 0 {
            remaining -= 1;
            max_tries -= 1;

            let draw = self.hasher.sip_hash(0, 0, &seed) % total;
            let rand_val = draw as f64 / total as f64;

            seed = rehash(&seed, &seed, self.hasher);

            // Pool choice has an equal prior; the weights only bias the
            // probability compare below, not which pool gets tried.
            let (pool, probability) = match self.hasher.sip_hash(0, 0, &seed) % 3 {
                0 => (Pool::Cgs, weights.cgs as f64 / 10.0),
                1 => (Pool::New, weights.new as f64 / 10.0),
                _ => (Pool::Any, weights.any as f64 / 10.0),
            };

            if rand_val >= probability {
                remaining += 1;
                max_tries += 1;
                continue;
            }

            let maybe = match pool {
                Pool::Cgs => self.sample_from_cgs_pool(distribution, &seed),
                Pool::New => self.sample_from_new_pool(&mut new_pool, &seed),
                Pool::Any => self.sample_from_any_pool(&seed),
            };

            let Some(candidate) = maybe else {
                remaining += 1;
                continue;
            };

            if !is_valid_invite_destination(candidate.address_type)
                || candidate.invites > max_outstanding_invites
                || candidate.address == genesis_address
                || unconfirmed_invites.contains(&candidate.address)
            {
                remaining += 1;
                continue;
            }

            if pool == Pool::New {
                selected_new.push(candidate);
            }
            seed = rehash_with_address(&seed, &candidate.address, self.hasher);
            selected.push(candidate);
        }

        (selected, selected_new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgs::Entrant;
    use crate::hashing::DefaultHasher;
    use crate::referral::Referral;

    fn store_with_confirmed(n: u8) -> Inner {
        let hasher = DefaultHasher;
        let mut store = Inner::default();
        let genesis = Address::from_bytes([0xffu8; 20]);
        store
            .insert_referral(
                Referral::new(AddressType::KeyId, genesis, vec![2; 33], vec![3; 64], Address::NULL, String::new(), 0, &hasher),
                0,
                true,
            )
            .unwrap();
        for i in 1..=n {
            let addr = Address::from_bytes([i; 20]);
            store
                .insert_referral(
                    Referral::new(AddressType::KeyId, addr, vec![2; 33], vec![3; 64], genesis, String::new(), 0, &hasher),
                    i as u32,
                    false,
                )
                .unwrap();
            store.update_confirmation(AddressType::KeyId, addr, 1).unwrap();
        }
        store
    }

    #[test]
    fn returns_nothing_when_no_confirmations_exist() {
        let store = Inner::default();
        let hasher = DefaultHasher;
        let sampler = InvitePoolSampler::new(&store, &hasher);
        let dist = CgsDistribution::new(Vec::new());
        let (selected, new_selected) = sampler.select_invite_addresses(
            &dist,
            [1u8; 32],
            Address::NULL,
            5,
            &HashSet::new(),
            10,
            InvitePoolWeights::default(),
        );
        assert!(selected.is_empty());
        assert!(new_selected.is_empty());
    }

    #[test]
    fn never_selects_genesis_address() {
        let store = store_with_confirmed(5);
        let hasher = DefaultHasher;
        let sampler = InvitePoolSampler::new(&store, &hasher);
        let genesis = Address::from_bytes([0xffu8; 20]);
        let entrants: Vec<Entrant> = (1..=5u8)
            .map(|i| Entrant {
                address_type: AddressType::KeyId,
                address: Address::from_bytes([i; 20]),
                balance: 100,
                aged_balance: 100,
                cgs: 100,
                sub_cgs: 100,
                beacon_height: 0,
                children: 0,
                network_size: 0,
            })
            .collect();
        let dist = CgsDistribution::new(entrants);

        let (selected, _) = sampler.select_invite_addresses(
            &dist,
            [3u8; 32],
            genesis,
            10,
            &HashSet::new(),
            10,
            InvitePoolWeights::default(),
        );
        assert!(selected.iter().all(|c| c.address != genesis));
    }

    #[test]
    fn excludes_addresses_marked_unconfirmed_invites() {
        let store = store_with_confirmed(3);
        let hasher = DefaultHasher;
        let sampler = InvitePoolSampler::new(&store, &hasher);
        let unconfirmed: HashSet<Address> = [Address::from_bytes([1u8; 20])].into_iter().collect();
        let dist = CgsDistribution::new(Vec::new());

        let (selected, _) = sampler.select_invite_addresses(
            &dist,
            [8u8; 32],
            Address::NULL,
            10,
            &unconfirmed,
            10,
            InvitePoolWeights::default(),
        );
        assert!(selected.iter().all(|c| c.address != Address::from_bytes([1u8; 20])));
    }
}
