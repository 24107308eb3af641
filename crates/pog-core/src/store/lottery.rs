//! The ambassador invite reservoir: a fixed-capacity min-heap populated by
//! weighted-reservoir sampling (Efraimidis-Spirakis), so that over time
//! the reservoir holds an ANV-weighted random sample of the whole
//! referral forest without ever storing more than `max_reservoir_size`
//! entrants. Grounded on `refdb.cpp`'s `AddAddressToLottery`,
//! `InsertLotteryEntrant`, `RemoveFromLottery`, `FindLotteryPos`.
//!
//! `WeightedKey`'s exact formula is a documented reconstruction, not a
//! consensus-bit-exact port: the source implementing
//! `pog::WeightedKeyForSampling` was not available to ground against. The
//! property it preserves — monotone increasing in ANV for a fixed random
//! draw, so heavier-weighted addresses are more likely to survive
//! reservoir eviction — is exactly what Efraimidis-Spirakis requires and
//! is covered by this module's tests.

use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressType};
use crate::error::{CoreError, InvariantError};
use crate::hashing::Hasher;
use crate::rational::Anv;

use super::Inner;

/// A monotone transform of a random draw and a weight, used to rank
/// reservoir entrants. Implements the Efraimidis-Spirakis key in
/// log-space (`ln(u) / w`) so it stays numerically stable for the tiny
/// `u` values and huge `w` values a long-running chain produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedKey(f64);

impl WeightedKey {
    pub fn from_raw(v: f64) -> Self {
        Self(v)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Derive a key from a 256-bit random draw and an ANV weight. `draw`
    /// is treated as a uniform sample in `(0, 1)` via its leading 8 bytes.
    pub fn compute(draw: &[u8; 32], weight: &Anv) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&draw[0..8]);
        let numerator = u64::from_be_bytes(buf);
        // Keep u strictly inside (0, 1) so ln(u) is finite and negative.
        let u = ((numerator as f64) + 1.0) / (u64::MAX as f64 + 2.0);

        let w = weight.to_amount().max(1) as f64;
        Self(u.ln() / w)
    }
}

impl Eq for WeightedKey {}

impl PartialOrd for WeightedKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightedKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// An undo record produced by [`Inner::add_address_to_lottery`], letting a
/// block disconnect reverse exactly what that call did: either remove an
/// address that was freshly added (`replaced_with == replaced_address`),
/// or restore the evicted entrant that `replaced_with` displaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryUndo {
    pub replaced_key: WeightedKey,
    pub replaced_address_type: AddressType,
    pub replaced_address: Address,
    pub replaced_with: Address,
}

fn heap_less(a: &(WeightedKey, AddressType, Address), b: &(WeightedKey, AddressType, Address)) -> bool {
    a.0 < b.0
}

impl Inner {
    pub fn lottery_heap_size(&self) -> usize {
        self.lottery_heap.len()
    }

    pub fn get_min_lottery_entrant(&self) -> Option<(WeightedKey, AddressType, Address)> {
        self.lottery_heap.first().copied()
    }

    pub fn find_lottery_pos(&mut self, address: &Address) -> usize {
        if let Some(pos) = self.lottery_pos.get(address) {
            return *pos;
        }
        match self.lottery_heap.iter().position(|(_, _, a)| a == address) {
            Some(pos) => {
                self.lottery_pos.insert(*address, pos);
                pos
            }
            None => self.lottery_heap.len(),
        }
    }

    /// Insert at the end of the heap and sift up. Caller must ensure the
    /// heap is below `max_reservoir_size` (pop first if it's full).
    pub fn insert_lottery_entrant(
        &mut self,
        key: WeightedKey,
        address_type: AddressType,
        address: Address,
        max_reservoir_size: u64,
    ) -> Result<(), CoreError> {
        debug_assert!((self.lottery_heap.len() as u64) < max_reservoir_size);

        self.lottery_heap.push((key, address_type, address));
        let mut pos = self.lottery_heap.len() - 1;

        while pos != 0 {
            let parent_pos = (pos - 1) / 2;
            if heap_less(&self.lottery_heap[parent_pos], &self.lottery_heap[pos]) {
                break;
            }
            self.lottery_heap.swap(parent_pos, pos);
            self.lottery_pos.insert(self.lottery_heap[pos].2, pos);
            pos = parent_pos;
        }
        self.lottery_pos.insert(address, pos);

        tracing::debug!(?address, pos, "added to lottery reservoir");
        Ok(())
    }

    pub fn pop_min_from_lottery_heap(&mut self) -> Result<(), CoreError> {
        self.remove_from_lottery_pos(0)
    }

    pub fn remove_from_lottery(&mut self, address: &Address) -> Result<(), CoreError> {
        let pos = self.find_lottery_pos(address);
        if pos >= self.lottery_heap.len() {
            return Ok(());
        }
        self.remove_from_lottery_pos(pos)
    }

    fn remove_from_lottery_pos(&mut self, current: usize) -> Result<(), CoreError> {
        let heap_size = self.lottery_heap.len();
        if heap_size == 0 {
            return Err(InvariantError::EmptyReservoir.into());
        }

        let last = self.lottery_heap[heap_size - 1];
        self.lottery_pos.remove(&self.lottery_heap[current].2);

        let mut current = current;
        let mut smallest_val = last;

        loop {
            let mut smallest = current;
            let left = 2 * current + 1;
            let right = 2 * current + 2;

            if left < heap_size && heap_less(&self.lottery_heap[left], &smallest_val) {
                smallest = left;
                smallest_val = self.lottery_heap[left];
            }
            if right < heap_size && heap_less(&self.lottery_heap[right], &smallest_val) {
                smallest = right;
                smallest_val = self.lottery_heap[right];
            }

            if smallest != current {
                self.lottery_heap[current] = smallest_val;
                self.lottery_pos.insert(smallest_val.2, current);
                current = smallest;
                smallest_val = last;
            } else {
                break;
            }
        }

        self.lottery_heap[current] = last;
        self.lottery_pos.insert(last.2, current);
        self.lottery_heap.pop();

        tracing::debug!(final_pos = current, "removed from lottery reservoir");
        Ok(())
    }

    /// Walk from `address` up to the root, at each hop deciding whether
    /// that ancestor should displace the reservoir's current minimum (or
    /// simply be added, while the reservoir isn't yet full). Returns one
    /// undo record per ancestor that was actually changed.
    ///
    /// `lottery_fix_height` reproduces a historical consensus bug fix
    /// bit-for-bit: before that height the same `rand_value`/ANV snapshot
    /// taken at the call site is reused unchanged at every ancestor hop;
    /// at/after it, both are refreshed at each hop (the ANV is re-read and
    /// the seed is re-hashed with the current ancestor's address mixed
    /// in), which the original project measured as correcting a bias that
    /// mattered only before the reservoir filled up.
    pub fn add_address_to_lottery(
        &mut self,
        height: u32,
        mut rand_value: [u8; 32],
        address_type: AddressType,
        address: Address,
        max_reservoir_size: u64,
        lottery_fix_height: u32,
        hasher: &dyn Hasher,
    ) -> Result<Vec<LotteryUndo>, CoreError> {
        if !address_type.is_reward_eligible() {
            return Ok(Vec::new());
        }

        let Some((_, mut anv)) = self.get_anv(&address) else { return Ok(Vec::new()) };

        let mut undos = Vec::new();
        let mut current_type = address_type;
        let mut current = Some(address);
        let max_levels = self.referrals.len() + 1;
        let mut level = 0;

        while let Some(addr) = current {
            if level >= max_levels {
                return Err(InvariantError::CycleDetected(addr).into());
            }

            if height >= lottery_fix_height {
                let Some((_, refreshed)) = self.get_anv(&addr) else { break };
                anv = refreshed;
                let mut buf = Vec::with_capacity(32 + 20);
                buf.extend_from_slice(&rand_value);
                buf.extend_from_slice(addr.as_bytes());
                rand_value = hasher.hash256(&buf);
            } else if self.get_anv(&addr).is_none() {
                break;
            }

            let key = WeightedKey::compute(&rand_value, &anv);
            let heap_size = self.lottery_heap_size() as u64;

            if heap_size < max_reservoir_size {
                let pos = self.find_lottery_pos(&addr);
                if pos as u64 == heap_size {
                    self.insert_lottery_entrant(key, current_type, addr, max_reservoir_size)?;
                    undos.push(LotteryUndo {
                        replaced_key: key,
                        replaced_address_type: current_type,
                        replaced_address: addr,
                        replaced_with: addr,
                    });
                }
            } else if let Some((min_key, min_type, min_addr)) = self.get_min_lottery_entrant() {
                if min_key < key {
                    let pos = self.find_lottery_pos(&addr);
                    if pos as u64 == heap_size {
                        self.pop_min_from_lottery_heap()?;
                        self.insert_lottery_entrant(key, current_type, addr, max_reservoir_size)?;
                        undos.push(LotteryUndo {
                            replaced_key: min_key,
                            replaced_address_type: min_type,
                            replaced_address: min_addr,
                            replaced_with: addr,
                        });
                    }
                }
            }

            current = self.parent_address(&addr);
            if let Some(parent) = current {
                current_type = self
                    .get_referral(&parent)
                    .map(|r| r.address_type)
                    .unwrap_or(current_type);
            }
            level += 1;
        }

        Ok(undos)
    }

    /// Reverse one [`LotteryUndo`]: remove whatever currently sits at
    /// `replaced_with`, and if something was actually evicted (rather
    /// than a plain addition), restore it.
    pub fn undo_lottery_entrant(
        &mut self,
        undo: &LotteryUndo,
        max_reservoir_size: u64,
    ) -> Result<(), CoreError> {
        self.remove_from_lottery(&undo.replaced_with)?;

        if undo.replaced_with == undo.replaced_address {
            return Ok(());
        }

        self.insert_lottery_entrant(
            undo.replaced_key,
            undo.replaced_address_type,
            undo.replaced_address,
            max_reservoir_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_maintains_min_at_root() {
        let mut inner = Inner::default();
        let keys = [0.9_f64, 0.1, 0.5, 0.3, 0.7];
        for (i, k) in keys.iter().enumerate() {
            inner
                .insert_lottery_entrant(
                    WeightedKey::from_raw(*k),
                    AddressType::KeyId,
                    Address::from_bytes([i as u8; 20]),
                    100,
                )
                .unwrap();
        }
        let min = inner.get_min_lottery_entrant().unwrap();
        assert_eq!(min.0.value(), 0.1);
    }

    #[test]
    fn remove_min_preserves_heap_property() {
        let mut inner = Inner::default();
        let keys = [0.9_f64, 0.1, 0.5, 0.3, 0.7, 0.2];
        for (i, k) in keys.iter().enumerate() {
            inner
                .insert_lottery_entrant(
                    WeightedKey::from_raw(*k),
                    AddressType::KeyId,
                    Address::from_bytes([i as u8; 20]),
                    100,
                )
                .unwrap();
        }
        inner.pop_min_from_lottery_heap().unwrap();
        let min = inner.get_min_lottery_entrant().unwrap();
        assert_eq!(min.0.value(), 0.2);
        assert_eq!(inner.lottery_heap_size(), 5);
    }

    #[test]
    fn weighted_key_is_monotone_in_weight_for_fixed_draw() {
        let draw = [7u8; 32];
        let small = WeightedKey::compute(&draw, &Anv::from_amount(10));
        let big = WeightedKey::compute(&draw, &Anv::from_amount(10_000));
        assert!(big > small);
    }

    #[test]
    fn undo_of_plain_addition_just_removes() {
        let mut inner = Inner::default();
        let addr = Address::from_bytes([1u8; 20]);
        inner
            .insert_lottery_entrant(WeightedKey::from_raw(0.5), AddressType::KeyId, addr, 10)
            .unwrap();
        let undo = LotteryUndo {
            replaced_key: WeightedKey::from_raw(0.5),
            replaced_address_type: AddressType::KeyId,
            replaced_address: addr,
            replaced_with: addr,
        };
        inner.undo_lottery_entrant(&undo, 10).unwrap();
        assert_eq!(inner.lottery_heap_size(), 0);
    }

    #[test]
    fn undo_of_eviction_restores_displaced_entrant() {
        let mut inner = Inner::default();
        let evicted = Address::from_bytes([1u8; 20]);
        let winner = Address::from_bytes([2u8; 20]);
        inner
            .insert_lottery_entrant(WeightedKey::from_raw(0.1), AddressType::KeyId, evicted, 1)
            .unwrap();
        // Reservoir full at capacity 1: evict `evicted`, insert `winner`.
        inner.pop_min_from_lottery_heap().unwrap();
        inner
            .insert_lottery_entrant(WeightedKey::from_raw(0.9), AddressType::KeyId, winner, 1)
            .unwrap();

        let undo = LotteryUndo {
            replaced_key: WeightedKey::from_raw(0.1),
            replaced_address_type: AddressType::KeyId,
            replaced_address: evicted,
            replaced_with: winner,
        };
        inner.undo_lottery_entrant(&undo, 1).unwrap();

        assert_eq!(inner.lottery_heap_size(), 1);
        assert_eq!(inner.get_min_lottery_entrant().unwrap().2, evicted);
    }
}
