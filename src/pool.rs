//! The wallet's set of spendable coins.

use std::collections::{BTreeMap, HashSet};

use crate::{
    types::{CandidateGroup, Coin, CoinId},
    weight::SEGWIT_INPUT_WEIGHT,
};

/// An ordered collection of candidate groups over an arena of coins.
///
/// Groups refer to coins by [`CoinId`]; the arena owns the coins themselves. Ids come from a
/// counter that only moves forward, so an id is never handed out twice by the same pool.
#[derive(Debug, Default, Clone)]
pub struct UtxoPool {
    coins: BTreeMap<CoinId, Coin>,
    groups: Vec<Vec<CoinId>>,
    next_id: u64,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a coin with a fresh id without admitting it to the pool.
    pub fn mint(&mut self, value: u64) -> Coin {
        let id = CoinId(self.next_id);
        self.next_id += 1;
        Coin {
            id,
            value,
            input_weight: SEGWIT_INPUT_WEIGHT,
        }
    }

    /// Admits a new coin of `amount` sats as its own group.
    pub fn deposit(&mut self, amount: u64) -> CoinId {
        let coin = self.mint(amount);
        self.admit(coin);
        log::trace!("Deposited {} sats as {}", amount, coin.id);
        coin.id
    }

    fn admit(&mut self, coin: Coin) {
        self.coins.insert(coin.id, coin);
        self.groups.push(vec![coin.id]);
    }

    /// Number of candidate groups currently held.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn coin(&self, id: CoinId) -> Option<&Coin> {
        self.coins.get(&id)
    }

    pub fn contains(&self, id: CoinId) -> bool {
        self.coins.contains_key(&id)
    }

    /// Sum of all coin values currently held.
    pub fn balance(&self) -> u64 {
        self.coins.values().map(|coin| coin.value).sum()
    }

    /// Value of every group, in pool order.
    pub fn values(&self) -> Vec<u64> {
        self.groups
            .iter()
            .map(|ids| ids.iter().filter_map(|id| self.coins.get(id)).map(|c| c.value).sum())
            .collect()
    }

    /// Fee needed to eventually spend every held coin at `feerate`.
    pub fn cost_to_empty_at_rate(&self, feerate: f32) -> f64 {
        self.input_weight() as f64 * feerate as f64
    }

    /// Total input weight of spending every held coin.
    pub fn input_weight(&self) -> u64 {
        self.coins.values().map(|coin| u64::from(coin.input_weight)).sum()
    }

    /// Snapshot of the groups as selection candidates, in pool order.
    pub fn candidates(&self) -> Vec<CandidateGroup> {
        self.groups
            .iter()
            .filter_map(|ids| {
                let coins = ids.iter().filter_map(|id| self.coins.get(id)).copied();
                CandidateGroup::new(coins.collect())
            })
            .collect()
    }

    /// Removes every coin in `spent_ids`, drops the groups left empty, and appends each of
    /// `new_coins` as a singleton group.
    pub fn replace(&mut self, spent_ids: &HashSet<CoinId>, new_coins: Vec<Coin>) {
        for id in spent_ids {
            self.coins.remove(id);
        }
        for group in self.groups.iter_mut() {
            group.retain(|id| !spent_ids.contains(id));
        }
        self.groups.retain(|group| !group.is_empty());

        log::debug!(
            "Pool rewrite: {} coins spent, {} coins admitted, {} groups remain",
            spent_ids.len(),
            new_coins.len(),
            self.groups.len() + new_coins.len()
        );
        for coin in new_coins {
            self.admit(coin);
        }
    }
}
