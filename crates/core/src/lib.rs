//! Keeper core logic.
//!
//! This crate provides the bite keeper's decision loop:
//! - Exact Wad/Ray fixed-point arithmetic
//! - Eligibility evaluation against the shutdown parameter snapshot
//! - Candidate sourcing (exhaustive ledger walk or top-K from the index)
//! - Batch submission with continue-on-failure semantics
//! - The block-driven one-shot scheduler
//! - Configuration loading

mod candidates;
pub mod config;
mod evaluator;
mod keeper;
pub mod numeric;
mod submitter;

pub use candidates::CandidateSource;
pub use config::{GasConfig, KeeperConfig};
pub use evaluator::{qualifies, ShutdownParams};
pub use keeper::{BiteKeeper, KeeperState};
pub use numeric::{NumericError, Ray, Wad, RAY, WAD};
pub use submitter::{chunk_ids, BatchSubmitter, SweepStats};
