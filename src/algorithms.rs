//! The bundled selection strategies.
//!
//! Each strategy sees one [`SelectionRequest`] and reports a [`SelectionResult`]. Strategies do not
//! validate the request; [`CoinSelector`](crate::selectcoin::CoinSelector) does that once before
//! the cascade starts.

pub mod bnb;
pub mod knapsack;
pub mod srd;

pub use bnb::{select_coin_bnb, BranchAndBound};
pub use knapsack::{select_coin_knapsack, Knapsack};
pub use srd::{select_coin_srd, SingleRandomDraw};

use crate::types::{Algorithm, SelectionRequest, SelectionResult};

/// A coin selection algorithm that can be tried by the cascade.
pub trait SelectionStrategy {
    /// Tag reported when this strategy wins.
    fn algorithm(&self) -> Algorithm;

    /// Try to select candidates covering the request's target and fee.
    fn attempt(&mut self, request: &SelectionRequest) -> SelectionResult;
}

impl<S: SelectionStrategy + ?Sized> SelectionStrategy for Box<S> {
    fn algorithm(&self) -> Algorithm {
        (**self).algorithm()
    }

    fn attempt(&mut self, request: &SelectionRequest) -> SelectionResult {
        (**self).attempt(request)
    }
}
