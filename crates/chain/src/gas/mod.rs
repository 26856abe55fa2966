//! Gas pricing strategies for liquidation transactions.
//!
//! A pricer maps the time elapsed since the first submission attempt of a
//! logical transaction to a gas price. The elapsed clock is owned by the
//! transaction sender and anchored at the first attempt, so every rebroadcast
//! of the same transaction walks the same escalation schedule.
//!
//! # Example
//!
//! ```rust,ignore
//! use keeper_chain::gas::{GasPricer, FixedGasPrice, IncreasingGasPrice};
//! use std::time::Duration;
//!
//! let pricer = IncreasingGasPrice::default();
//! assert_eq!(pricer.price_at(Duration::ZERO), 5_000_000_000);
//! ```

mod fixed;
mod increasing;

pub use fixed::FixedGasPrice;
pub use increasing::IncreasingGasPrice;

use std::fmt::Debug;
use std::time::Duration;

/// One gwei, in wei.
pub const GWEI: u128 = 1_000_000_000;

/// Time-dependent gas pricing policy.
///
/// `price_at` is pure: given the same elapsed duration it always returns the
/// same price, which keeps escalation testable without touching a wall clock.
pub trait GasPricer: Send + Sync + Debug {
    /// Gas price in wei for a (re)submission `elapsed` after the first attempt.
    fn price_at(&self, elapsed: Duration) -> u128;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}
