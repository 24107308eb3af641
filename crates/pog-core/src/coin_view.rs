//! The coin/balance view this crate reads but does not manage. UTXO
//! tracking and coin maturity are owned by the embedding node; CGS only
//! needs to ask "what coins does this address currently hold".

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A single coin: the block height it confirmed at and its amount, the
/// shape used by the original chain's CGS aging computation
/// (`pog3::CachedEntrant`'s coin list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub height: u32,
    pub amount: u64,
}

/// Read-only view over an address's held coins, supplied by the host.
pub trait CoinView {
    fn addresses(&self) -> Vec<Address>;
    fn coins(&self, address: &Address) -> &[Coin];
}

/// An in-memory `CoinView` useful for tests and small deployments.
#[derive(Debug, Default, Clone)]
pub struct MapCoinView {
    coins: std::collections::HashMap<Address, Vec<Coin>>,
}

impl MapCoinView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address, coin: Coin) {
        self.coins.entry(address).or_default().push(coin);
    }
}

impl CoinView for MapCoinView {
    fn addresses(&self) -> Vec<Address> {
        self.coins.keys().copied().collect()
    }

    fn coins(&self, address: &Address) -> &[Coin] {
        self.coins.get(address).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_coin_view_returns_empty_slice_for_unknown_address() {
        let view = MapCoinView::new();
        assert!(view.coins(&Address::NULL).is_empty());
    }

    #[test]
    fn map_coin_view_accumulates_coins_per_address() {
        let mut view = MapCoinView::new();
        let addr = Address::from_bytes([7u8; 20]);
        view.insert(addr, Coin { height: 10, amount: 100 });
        view.insert(addr, Coin { height: 20, amount: 50 });
        assert_eq!(view.coins(&addr).len(), 2);
    }
}
