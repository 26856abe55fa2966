//! Block-driven keeper scheduler.
//!
//! The keeper idles between blocks. Each new block triggers one check cycle:
//! if the ledger is still live the cycle is a no-op; once it is caged the
//! keeper runs a single full liquidation sweep and terminates. Shutdown is a
//! one-time global event, so the sweep never re-arms after a successful pass.

use crate::candidates::CandidateSource;
use crate::evaluator::ShutdownParams;
use crate::submitter::{BatchSubmitter, SweepStats};
use anyhow::Result;
use keeper_chain::{BiteCdps, Tub, Vox};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// Scheduler states. One-way: Idle -> Checking -> (Idle | Done).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeeperState {
    /// Waiting for the next block.
    Idle,
    /// Running a check cycle.
    Checking,
    /// Sweep completed on a caged ledger; the process is done.
    Done,
}

impl KeeperState {
    /// Where a check cycle ends up, given the ledger's shutdown flag.
    ///
    /// A live ledger returns the keeper to Idle with nothing else to do; a
    /// caged ledger means the cycle runs the sweep and finishes in Done.
    pub fn after_check(caged: bool) -> KeeperState {
        if caged {
            KeeperState::Done
        } else {
            KeeperState::Idle
        }
    }
}

/// The bite keeper: watches the Tub and bites every cup that still owes
/// anything once the ledger has been shut down.
pub struct BiteKeeper {
    tub: Arc<Tub>,
    vox: Arc<Vox>,
    source: CandidateSource,
    /// Batch contract, present iff running in indexed mode.
    bitecdps: Option<BiteCdps>,
    submitter: BatchSubmitter,
    state: KeeperState,
}

impl BiteKeeper {
    pub fn new(
        tub: Arc<Tub>,
        vox: Arc<Vox>,
        source: CandidateSource,
        bitecdps: Option<BiteCdps>,
        submitter: BatchSubmitter,
    ) -> Self {
        Self {
            tub,
            vox,
            source,
            bitecdps,
            submitter,
            state: KeeperState::Idle,
        }
    }

    pub fn state(&self) -> KeeperState {
        self.state
    }

    /// Consume block notifications until a sweep completes.
    ///
    /// Cycle-level failures (ledger RPC or index unreachable) drop the
    /// keeper back to Idle; the whole cycle retries on the next block.
    pub async fn run(
        &mut self,
        mut blocks: mpsc::Receiver<u64>,
        watch_shutdown: oneshot::Sender<()>,
    ) -> Result<()> {
        info!(mode = self.source.mode(), "Keeper running, waiting for blocks");

        while let Some(block) = blocks.recv().await {
            match self.on_block(block).await {
                Ok(KeeperState::Done) => {
                    info!("Sweep complete, terminating");
                    let _ = watch_shutdown.send(());
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    error!(block, error = %e, "Check cycle aborted, retrying on next block");
                    self.state = KeeperState::Idle;
                }
            }
        }

        info!("Block stream ended");
        Ok(())
    }

    /// Run one check cycle for a new block.
    pub async fn on_block(&mut self, block: u64) -> Result<KeeperState> {
        self.state = KeeperState::Checking;

        // A live ledger ends the cycle right here: no parameter fetches, no
        // candidate sourcing, no submissions
        if !self.tub.off().await? {
            info!(block, "Single Collateral Dai live");
            self.state = KeeperState::after_check(false);
            return Ok(self.state);
        }

        info!(block, "Single Collateral Dai has been caged");
        info!("Starting to bite all cups in the tub");

        // One snapshot per cycle; every cup sees the same parameters
        let params = ShutdownParams::fetch(&self.tub, &self.vox).await?;
        let ids = self.source.produce().await?;
        info!(candidates = ids.len(), mode = self.source.mode(), "Candidates collected");

        let stats = match &self.bitecdps {
            Some(bitecdps) => self.submitter.bite_batched(bitecdps, &ids).await,
            None => self.submitter.bite_each(&self.tub, &params, &ids).await,
        };
        log_sweep(&stats);

        self.state = KeeperState::after_check(true);
        Ok(self.state)
    }
}

fn log_sweep(stats: &SweepStats) {
    info!(
        evaluated = stats.evaluated,
        eligible = stats.eligible,
        submitted = stats.submitted,
        failed = stats.failed,
        skipped = stats.skipped,
        "Sweep finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use keeper_chain::{IncreasingGasPrice, TransactionSender};
    use std::time::Duration;

    // Well-known throwaway development key
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_keeper() -> BiteKeeper {
        let tub = Arc::new(Tub::new("http://localhost:8545", Address::ZERO));
        let vox = Arc::new(Vox::new("http://localhost:8545", Address::ZERO));
        let sender = Arc::new(
            TransactionSender::new(
                TEST_KEY,
                "http://localhost:8545",
                1,
                Box::new(IncreasingGasPrice::default()),
                Duration::from_secs(60),
                Duration::from_secs(3600),
            )
            .unwrap(),
        );
        let submitter = BatchSubmitter::new(sender, 100);
        BiteKeeper::new(
            tub.clone(),
            vox,
            CandidateSource::Exhaustive { tub },
            None,
            submitter,
        )
    }

    #[test]
    fn test_live_ledger_returns_to_idle() {
        assert_eq!(KeeperState::after_check(false), KeeperState::Idle);
    }

    #[test]
    fn test_caged_ledger_finishes_done() {
        assert_eq!(KeeperState::after_check(true), KeeperState::Done);
    }

    #[test]
    fn test_keeper_starts_idle() {
        let keeper = test_keeper();
        assert_eq!(keeper.state(), KeeperState::Idle);
        assert_eq!(keeper.source.mode(), "exhaustive");
    }
}
