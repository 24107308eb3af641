//! Referral graph, Aggregate Network Value propagation, and the two
//! weighted lotteries (ambassador and invite-pool) that gate block rewards
//! in a Proof-of-Growth consensus engine.
//!
//! This crate is a pure library: no I/O, no RPC surface, no persistence.
//! An embedding node owns the chain tip, the UTXO set (exposed to this
//! crate through [`coin_view::CoinView`]), and the actual hashing/signing
//! stack (exposed through [`hashing::Hasher`]); this crate owns the
//! referral forest, the ANV ledger, the confirmation index, and the
//! lottery reservoirs that hang off them.

pub mod address;
pub mod alias;
pub mod cgs;
pub mod coin_view;
pub mod error;
pub mod hashing;
pub mod invites;
pub mod orderer;
pub mod params;
pub mod rational;
pub mod referral;
pub mod selector;
pub mod store;

pub use address::{Address, AddressType, ReferralId};
pub use cgs::{CgsEngine, CgsWeights, Entrant};
pub use coin_view::{Coin, CoinView, MapCoinView};
pub use error::{AliasError, CoreError, InvariantError, OrderingError, ReferralError, Result};
pub use hashing::{DefaultHasher, Hasher};
pub use invites::InvitePoolSampler;
pub use orderer::order_referrals;
pub use params::{ChainParams, InvitePoolWeights};
pub use rational::Anv;
pub use referral::Referral;
pub use selector::{AmbassadorSelector, CgsDistribution};
pub use store::{ConfirmedAddress, Inner, LotteryUndo, ReferralStore, WeightedKey};
