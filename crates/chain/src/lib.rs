//! Keeper chain interaction layer.
//!
//! This crate provides:
//! - Contract bindings and typed wrappers for Tub, Vox, and BiteCdps
//! - A WebSocket block watcher with graceful termination
//! - Transaction signing and sending with rebroadcast-at-higher-price
//! - Gas pricing strategies (fixed and time-escalating)

mod block_watch;
mod contracts;
pub mod gas;
mod signer;

pub use block_watch::BlockWatcher;
pub use contracts::{cup_id_to_bytes32, BiteCdps, CupState, Tub, Vox};
pub use gas::{FixedGasPrice, GasPricer, IncreasingGasPrice, GWEI};
pub use signer::{SubmitError, TransactionSender};
