//! Candidate sourcing strategies.
//!
//! Two mutually exclusive ways to decide which cups to look at, selected by
//! configuration at startup:
//!
//! - **Exhaustive**: walk every id `1..=cupi` and let the evaluator decide.
//!   Correct by construction, linear in ledger size.
//! - **Indexed**: take the top-K cups by debt from the external index and
//!   trust its ranking. This skips per-cup evaluation and assumes the index
//!   reflects debt state as of the triggering block; staleness there means a
//!   wasted (but harmless, because bites are idempotent) batch entry.

use anyhow::Result;
use keeper_api::CupIndexClient;
use keeper_chain::Tub;
use std::sync::Arc;
use tracing::info;

/// Where a check cycle gets its cup ids from.
pub enum CandidateSource {
    /// Enumerate every cup in the Tub.
    Exhaustive { tub: Arc<Tub> },
    /// Top-K pre-ranked cups from the index service.
    Indexed {
        index: Arc<CupIndexClient>,
        top: usize,
    },
}

impl CandidateSource {
    /// Produce the cup ids for this cycle.
    pub async fn produce(&self) -> Result<Vec<u64>> {
        match self {
            CandidateSource::Exhaustive { tub } => {
                let count = tub.cupi().await?;
                info!(cups = count, "Enumerating every cup in the tub");
                Ok((1..=count).collect())
            }
            CandidateSource::Indexed { index, top } => {
                info!(top, "Fetching top cups from the index");
                let cups = index.fetch_top_cups(*top).await?;
                Ok(cups.into_iter().map(|cup| cup.id).collect())
            }
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            CandidateSource::Exhaustive { .. } => "exhaustive",
            CandidateSource::Indexed { .. } => "indexed",
        }
    }
}
