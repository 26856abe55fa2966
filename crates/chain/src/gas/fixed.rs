//! Constant gas price, operator-supplied.

use super::GasPricer;
use std::time::Duration;

/// Fixed gas price: the same value regardless of how long a transaction has
/// been pending. Useful on quiet chains or for deterministic fee budgeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedGasPrice {
    price: u128,
}

impl FixedGasPrice {
    /// Create a pricer that always returns `price` (wei).
    pub fn new(price: u128) -> Self {
        Self { price }
    }
}

impl GasPricer for FixedGasPrice {
    fn price_at(&self, _elapsed: Duration) -> u128 {
        self.price
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gas::GWEI;

    #[test]
    fn test_fixed_price_ignores_elapsed() {
        let pricer = FixedGasPrice::new(129 * GWEI);
        assert_eq!(pricer.price_at(Duration::ZERO), 129 * GWEI);
        assert_eq!(pricer.price_at(Duration::from_secs(3600)), 129 * GWEI);
    }
}
