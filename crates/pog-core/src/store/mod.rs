//! The referral store: the in-memory forest of referral records plus the
//! ANV ledger, confirmation index, and ambassador lottery reservoir that
//! hang off it. Grounded on `refdb.{h,cpp}`'s `ReferralsViewDB`, collapsed
//! into a single in-process structure since persistence is explicitly out
//! of scope (a node embedding this crate owns its own storage engine).
//!
//! Exposed wrapped in a `RwLock`: block application takes the write lock
//! for the duration of one block's worth of mutation, while read-only
//! queries (wallet/RPC-style lookups an embedder might build) take the
//! read lock concurrently. Within a single write, cache entries are
//! replaced wholesale rather than mutated in place, matching the
//! reference's `ReferralsViewCache` read-through-replace discipline.

pub mod anv;
pub mod confirmation;
pub mod lottery;

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::address::{Address, AddressType};
use crate::error::{CoreError, ReferralError};
use crate::hashing::Hasher;
use crate::params::ChainParams;
use crate::rational::Anv;
use crate::referral::{self, Referral};

pub use confirmation::ConfirmedAddress;
pub use lottery::{LotteryUndo, WeightedKey};

/// The non-locked body of the store. Lives behind a `RwLock` in
/// [`ReferralStore`]; every method here assumes the caller already holds
/// the appropriate guard.
#[derive(Debug, Default)]
pub struct Inner {
    pub(crate) referrals: HashMap<Address, Referral>,
    pub(crate) by_hash: HashMap<[u8; 32], Address>,
    pub(crate) by_alias: HashMap<String, Address>,
    pub(crate) children: HashMap<Address, Vec<Address>>,
    pub(crate) anv: HashMap<Address, (AddressType, Anv)>,

    pub(crate) confirmations: HashMap<Address, (u64, i64)>,
    pub(crate) confirmation_by_idx: HashMap<u64, (AddressType, Address)>,
    pub(crate) total_confirmations: u64,
    pub(crate) pre_epoch_confirmed: bool,
    pub(crate) new_invite_rewarded_height: HashMap<Address, u32>,
    pub(crate) beacon_height: HashMap<Address, u32>,

    pub(crate) lottery_heap: Vec<(WeightedKey, AddressType, Address)>,
    pub(crate) lottery_pos: HashMap<Address, usize>,
}

impl Inner {
    pub fn get_referral(&self, address: &Address) -> Option<&Referral> {
        self.referrals.get(address)
    }

    pub fn get_referral_by_hash(&self, hash: &[u8; 32]) -> Option<&Referral> {
        self.by_hash.get(hash).and_then(|a| self.referrals.get(a))
    }

    /// Looks up a referral by alias. Only returns confirmed addresses,
    /// matching `GetReferral(alias)`'s `IsConfirmed` gate upstream.
    pub fn get_referral_by_alias(&self, alias: &str, normalize: bool) -> Option<&Referral> {
        let key = if normalize { crate::alias::normalize(alias) } else { alias.to_string() };
        if key.is_empty() || key.len() > crate::alias::MAX_ALIAS_LENGTH {
            return None;
        }
        let address = self.by_alias.get(&key)?;
        if !self.is_confirmed(address) {
            return None;
        }
        self.referrals.get(address)
    }

    pub fn exists(&self, address: &Address) -> bool {
        self.referrals.contains_key(address)
    }

    pub fn parent_address(&self, address: &Address) -> Option<Address> {
        self.referrals.get(address).map(|r| r.parent_address)
    }

    pub fn children_of(&self, address: &Address) -> &[Address] {
        self.children.get(address).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The height at which `address`'s referral was inserted ("beaconed"),
    /// or `0` if it's not known — matching genesis, which has no insertion
    /// height of its own.
    pub fn beacon_height(&self, address: &Address) -> u32 {
        self.beacon_height.get(address).copied().unwrap_or(0)
    }

    /// Insert a single referral. The referral's parent must already be
    /// present (genesis excepted), matching the requirement that a block's
    /// referrals be topologically ordered before insertion — see
    /// [`crate::orderer`]. Idempotent: re-inserting an address already in
    /// the store is a no-op, matching the round-trip property a block's
    /// referrals must satisfy on reconnect.
    pub fn insert_referral(&mut self, referral: Referral, height: u32, is_genesis: bool) -> Result<(), CoreError> {
        let address = referral.address();

        if self.referrals.contains_key(&address) {
            return Ok(());
        }

        if !is_genesis && !self.referrals.contains_key(&referral.parent_address) {
            return Err(ReferralError::OrphanReferral(address).into());
        }

        if !referral.alias.is_empty() {
            let normalized = crate::alias::normalize(&referral.alias);
            if self.by_alias.contains_key(&normalized) {
                return Err(ReferralError::DuplicateAlias.into());
            }
            self.by_alias.insert(normalized, address);
        }

        self.by_hash.insert(referral.hash(), address);
        self.children.entry(referral.parent_address).or_default().push(address);
        self.anv.insert(address, (referral.address_type, Anv::zero()));
        self.beacon_height.insert(address, height);
        self.referrals.insert(address, referral);

        tracing::debug!(?address, "inserted referral");
        Ok(())
    }
}

/// The referral store, concurrency-guarded the way the original
/// `ReferralsViewCache` is meant to be used by a single-threaded block
/// processor with occasional concurrent readers.
#[derive(Debug, Default)]
pub struct ReferralStore {
    inner: RwLock<Inner>,
}

impl ReferralStore {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Inner::default()) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("referral store lock poisoned")
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("referral store lock poisoned")
    }

    /// Insert the chain's genesis referral: the single root of the forest,
    /// with no parent requirement.
    pub fn insert_genesis(&self, referral: Referral) -> Result<(), CoreError> {
        self.write().insert_referral(referral, 0, true)
    }

    /// Insert a non-genesis referral, validating it first.
    pub fn insert(
        &self,
        referral: Referral,
        height: u32,
        params: &ChainParams,
    ) -> Result<(), CoreError> {
        referral::validate_basic(&referral, height, params.safer_alias_blockheight)?;
        self.write().insert_referral(referral, height, false)
    }
}
