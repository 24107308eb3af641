//! Ambassador selection: inverse-CDF sampling over the CGS distribution.
//! Grounded on `pog3/select.cpp`'s `CgsDistribution`/`AddressSelector`.
//!
//! The CDF is built by sorting entrants by `(cgs, address)` and prefix-
//! summing their scores; a draw is `siphash(seed) mod max_cgs`, located
//! via binary search. Each accepted draw re-hashes the seed with the
//! winner's address mixed in so consecutive draws are deterministic but
//! decorrelated; a rejected draw re-hashes the seed with itself so the
//! loop always makes forward progress.

use std::collections::HashSet;

use crate::address::{Address, AddressType};
use crate::cgs::Entrant;
use crate::hashing::Hasher;

/// A sorted, prefix-summed CGS distribution ready for inverse-CDF sampling.
pub struct CgsDistribution {
    sorted: Vec<Entrant>,
    prefix: Vec<u64>,
    max_cgs: u64,
}

impl CgsDistribution {
    pub fn new(mut entrants: Vec<Entrant>) -> Self {
        entrants.sort_by(|a, b| {
            (a.cgs.max(0) as u64, a.address).cmp(&(b.cgs.max(0) as u64, b.address))
        });

        let mut prefix = Vec::with_capacity(entrants.len());
        let mut running: u64 = 0;
        for e in &entrants {
            running += e.cgs.max(0) as u64;
            prefix.push(running);
        }
        let max_cgs = prefix.last().copied().unwrap_or(0);

        Self { sorted: entrants, prefix, max_cgs }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Draw one entrant using a 32-byte seed. Returns `None` when every
    /// entrant has zero CGS (there's nothing to weight by).
    pub fn sample(&self, seed: &[u8; 32], hasher: &dyn Hasher) -> Option<&Entrant> {
        if self.sorted.is_empty() || self.max_cgs == 0 {
            return None;
        }
        let draw = hasher.sip_hash(0, 0, seed) % self.max_cgs;
        let idx = self.prefix.partition_point(|&cum| cum <= draw);
        self.sorted.get(idx)
    }
}

/// Draws ambassador candidates from a [`CgsDistribution`], rejecting
/// addresses already sampled, below the configured stake minimum, not
/// confirmed, or whose address type isn't ambassador-eligible.
pub struct AmbassadorSelector<'a> {
    distribution: &'a CgsDistribution,
    sampled: HashSet<Address>,
}

impl<'a> AmbassadorSelector<'a> {
    pub fn new(distribution: &'a CgsDistribution) -> Self {
        Self { distribution, sampled: HashSet::new() }
    }

    /// Select up to `n` distinct, eligible ambassadors. `is_confirmed` and
    /// `stake_minimum` are injected so callers can wire in the store's
    /// confirmation index and the height-dependent stake schedule.
    pub fn select(
        &mut self,
        mut seed: [u8; 32],
        n: usize,
        stake_minimum: i64,
        is_confirmed: impl Fn(&Address) -> bool,
        hasher: &dyn Hasher,
    ) -> Vec<Entrant> {
        let size = self.distribution.len();
        let mut out = Vec::with_capacity(n.min(size));
        let mut remaining = n.min(size);
        let mut max_tries = n.max(size / 2).min(size);

        while remaining > 0 && max_tries > 0 {
            max_tries -= 1;

            let Some(sampled) = self.distribution.sample(&seed, hasher) else {
                seed = rehash(&seed, &seed, hasher);
                continue;
            };

            seed = rehash_with_address(&seed, &sampled.address, hasher);

            let eligible = !self.sampled.contains(&sampled.address)
                && sampled.balance >= stake_minimum
                && is_confirmed(&sampled.address)
                && matches!(sampled.address_type, AddressType::KeyId | AddressType::ScriptId);

            if eligible {
                self.sampled.insert(sampled.address);
                out.push(sampled.clone());
                remaining -= 1;
            }
        }

        out
    }
}

pub(crate) fn rehash(a: &[u8; 32], b: &[u8; 32], hasher: &dyn Hasher) -> [u8; 32] {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(a);
    buf.extend_from_slice(b);
    hasher.hash256(&buf)
}

pub(crate) fn rehash_with_address(seed: &[u8; 32], address: &Address, hasher: &dyn Hasher) -> [u8; 32] {
    let mut buf = Vec::with_capacity(52);
    buf.extend_from_slice(seed);
    buf.extend_from_slice(address.as_bytes());
    hasher.hash256(&buf)
}
