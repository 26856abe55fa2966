//! Time-escalating gas price.

use super::{GasPricer, GWEI};
use std::time::Duration;

/// Gas price that steps up the longer a transaction stays unmined.
///
/// Price for a given elapsed time is
/// `min(initial_price + increase_by * floor(elapsed / every_secs), max_price)`.
/// Arithmetic saturates, so extreme parameters cannot wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncreasingGasPrice {
    /// Price of the first attempt, in wei.
    pub initial_price: u128,
    /// Step added per interval, in wei.
    pub increase_by: u128,
    /// Interval length in seconds.
    pub every_secs: u64,
    /// Hard cap, in wei.
    pub max_price: u128,
}

impl IncreasingGasPrice {
    pub fn new(initial_price: u128, increase_by: u128, every_secs: u64, max_price: u128) -> Self {
        Self {
            initial_price,
            increase_by,
            every_secs,
            max_price,
        }
    }
}

impl Default for IncreasingGasPrice {
    /// 5 gwei start, +10 gwei every 60 seconds, capped at 300 gwei.
    fn default() -> Self {
        Self {
            initial_price: 5 * GWEI,
            increase_by: 10 * GWEI,
            every_secs: 60,
            max_price: 300 * GWEI,
        }
    }
}

impl GasPricer for IncreasingGasPrice {
    fn price_at(&self, elapsed: Duration) -> u128 {
        let steps = if self.every_secs == 0 {
            0
        } else {
            elapsed.as_secs() / self.every_secs
        };
        let escalation = self.increase_by.saturating_mul(steps as u128);
        self.initial_price
            .saturating_add(escalation)
            .min(self.max_price)
    }

    fn name(&self) -> &'static str {
        "increasing"
    }
}
