//! Bite submission: per-cup in exhaustive mode, chunked in indexed mode.
//!
//! Every submission is an independent transaction. A failed or reverted bite
//! is logged and the sweep moves on to the next cup or chunk; one bad
//! transaction never takes down the rest of the cycle.

use crate::evaluator::{qualifies, ShutdownParams};
use crate::numeric::{Ray, Wad};
use keeper_chain::{BiteCdps, TransactionSender, Tub};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Gas limit for a single-cup bite.
const BITE_GAS_LIMIT: u64 = 500_000;

/// Gas limit for a batched BiteCdps call; sized for a full 100-cup chunk.
const BATCH_BITE_GAS_LIMIT: u64 = 8_000_000;

/// Outcome counters for one sweep, logged when the cycle finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub evaluated: usize,
    pub eligible: usize,
    pub submitted: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Split a candidate list into fixed-size chunks, last one short.
///
/// An empty candidate list yields no chunks at all, so a sweep with nothing
/// to bite never submits an empty batch transaction.
pub fn chunk_ids(ids: &[u64], chunk_size: usize) -> Vec<&[u64]> {
    if ids.is_empty() {
        return Vec::new();
    }
    if chunk_size == 0 {
        return vec![ids];
    }
    ids.chunks(chunk_size).collect()
}

/// Submits bite transactions for the qualifying set.
pub struct BatchSubmitter {
    sender: Arc<TransactionSender>,
    chunk_size: usize,
}

impl BatchSubmitter {
    pub fn new(sender: Arc<TransactionSender>, chunk_size: usize) -> Self {
        Self { sender, chunk_size }
    }

    /// Exhaustive mode: evaluate each candidate against the snapshot and
    /// bite the ones that qualify, one transaction per cup.
    pub async fn bite_each(
        &self,
        tub: &Tub,
        params: &ShutdownParams,
        ids: &[u64],
    ) -> SweepStats {
        let mut stats = SweepStats::default();

        for &id in ids {
            stats.evaluated += 1;

            // Per-cup reads or a zero tag only cost us this cup
            let (cup, rue) = match self.read_cup(tub, id).await {
                Some(state) => state,
                None => {
                    stats.skipped += 1;
                    continue;
                }
            };
            let owe = match params.owed(rue) {
                Ok(owe) => owe,
                Err(e) => {
                    error!(cup = id, error = %e, "Skipping cup, owe undefined");
                    stats.skipped += 1;
                    continue;
                }
            };

            if !qualifies(owe, Wad::from_raw(cup.art)) {
                continue;
            }
            stats.eligible += 1;

            info!(cup = id, owe = %owe, ink = %cup.ink, "Biting cup");
            match self
                .sender
                .submit(tub.address(), tub.bite_calldata(id), BITE_GAS_LIMIT)
                .await
            {
                Ok(tx_hash) => {
                    stats.submitted += 1;
                    info!(cup = id, tx_hash = %tx_hash, "Cup bitten");
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(cup = id, error = %e, "Bite failed, continuing sweep");
                }
            }
        }

        stats
    }

    /// Indexed mode: trust the index ranking and bite the candidate list in
    /// fixed-size chunks, one batched transaction per chunk.
    pub async fn bite_batched(&self, bitecdps: &BiteCdps, ids: &[u64]) -> SweepStats {
        let mut stats = SweepStats {
            evaluated: ids.len(),
            eligible: ids.len(),
            ..SweepStats::default()
        };

        for chunk in chunk_ids(ids, self.chunk_size) {
            info!(
                cups = chunk.len(),
                first = chunk.first().copied().unwrap_or(0),
                "Submitting bite batch"
            );
            match self
                .sender
                .submit(
                    bitecdps.address(),
                    bitecdps.bite_calldata(chunk),
                    BATCH_BITE_GAS_LIMIT,
                )
                .await
            {
                Ok(tx_hash) => {
                    stats.submitted += 1;
                    info!(cups = chunk.len(), tx_hash = %tx_hash, "Batch bitten");
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(cups = chunk.len(), error = %e, "Batch bite failed, continuing with remaining chunks");
                }
            }
        }

        stats
    }

    async fn read_cup(
        &self,
        tub: &Tub,
        id: u64,
    ) -> Option<(keeper_chain::CupState, Ray)> {
        let cup = match tub.cup(id).await {
            Ok(cup) => cup,
            Err(e) => {
                warn!(cup = id, error = %e, "Failed to read cup state, skipping");
                return None;
            }
        };
        let tab = match tub.tab(id).await {
            Ok(tab) => tab,
            Err(e) => {
                warn!(cup = id, error = %e, "Failed to read cup debt, skipping");
                return None;
            }
        };
        Some((cup, Ray::from_wad(Wad::from_raw(tab))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_fills_then_remainders() {
        let ids: Vec<u64> = (1..=237).collect();
        let chunks = chunk_ids(&ids, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 37);
        assert_eq!(chunks[0][0], 1);
        assert_eq!(chunks[2][36], 237);
    }

    #[test]
    fn test_chunking_exact_multiple() {
        let ids: Vec<u64> = (1..=200).collect();
        let chunks = chunk_ids(&ids, 100);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 100));
    }

    #[test]
    fn test_chunking_small_set() {
        let ids = vec![9, 4, 7];
        let chunks = chunk_ids(&ids, 100);
        assert_eq!(chunks, vec![&[9, 4, 7][..]]);
    }

    #[test]
    fn test_chunking_empty_set() {
        let chunks = chunk_ids(&[], 100);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_zero_chunk_size_degrades_to_one_batch() {
        let ids = vec![1, 2, 3];
        let chunks = chunk_ids(&ids, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 3);
    }

    #[test]
    fn test_zero_chunk_size_with_no_candidates_yields_no_batches() {
        assert!(chunk_ids(&[], 0).is_empty());
    }

    #[test]
    fn test_cup_state_art_feeds_eligibility_check() {
        use crate::evaluator::ShutdownParams;
        use alloy::primitives::U256;
        use keeper_chain::CupState;

        let params = ShutdownParams {
            axe: Ray::ONE,
            par: Ray::ONE,
            tag: Ray::ONE,
        };

        // Raw contract state, exactly as the sweep reads it off-chain
        let live = CupState {
            ink: U256::from(4) * crate::numeric::WAD,
            art: U256::from(1000) * crate::numeric::WAD,
        };
        let bitten = CupState {
            ink: live.ink,
            art: U256::ZERO,
        };

        let rue = Ray::from_wad(Wad::from_raw(live.art));
        let owe = params.owed(rue).unwrap();
        assert!(qualifies(owe, Wad::from_raw(live.art)));
        assert!(!qualifies(owe, Wad::from_raw(bitten.art)));
    }
}
