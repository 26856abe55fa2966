//! Cup eligibility evaluation against the shutdown parameter snapshot.
//!
//! Once the Tub is caged, three global parameters decide what every cup owes:
//! the liquidation penalty `axe`, the target price `par`, and the reference
//! price `tag` frozen at shutdown. They are fetched once per check cycle and
//! every cup in that cycle is evaluated against the same snapshot.

use crate::numeric::{NumericError, Ray, Wad};
use keeper_chain::{Tub, Vox};
use tracing::debug;

/// Global liquidation parameters, valid only after shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownParams {
    /// Liquidation penalty [Ray]. Fixed at 1 Ray at cage.
    pub axe: Ray,
    /// Target price [Ray]. Typically 1 Ray.
    pub par: Ray,
    /// Reference/oracle price [Ray], frozen at shutdown.
    pub tag: Ray,
}

impl ShutdownParams {
    /// Read the snapshot from the caged ledger.
    pub async fn fetch(tub: &Tub, vox: &Vox) -> anyhow::Result<Self> {
        let params = Self {
            axe: Ray::from_raw(tub.axe().await?),
            par: Ray::from_raw(vox.par().await?),
            tag: Ray::from_raw(tub.tag().await?),
        };
        debug!(axe = %params.axe, par = %params.par, tag = %params.tag, "Fetched shutdown parameters");
        Ok(params)
    }

    /// Amount owed in collateral terms, penalty included:
    /// `owe = rdiv(rmul(rmul(rue, axe), par), tag)`.
    ///
    /// `rue` is the cup's debt lifted to Ray. A zero `tag` would make every
    /// cup owe an undefined amount; that is a fatal precondition violation
    /// for the cup being evaluated, not a zero result.
    pub fn owed(&self, rue: Ray) -> Result<Ray, NumericError> {
        rue.rmul(self.axe).rmul(self.par).rdiv(self.tag)
    }
}

/// A cup qualifies for a bite iff it owes anything and still carries debt.
///
/// The `art != 0` leg is the idempotence guard: biting a cup zeroes its debt
/// on-chain, so a cup that was already bitten (this run or any earlier one)
/// never qualifies again.
pub fn qualifies(owe: Ray, art: Wad) -> bool {
    owe > Ray::ZERO && !art.is_zero()
}
