//! Keeper API clients for external services.
//!
//! This crate provides the HTTP client for the cup index: a GraphQL service
//! that serves pre-ranked liquidation candidates (cups ordered by debt,
//! descending, soft-deleted cups excluded).

mod cup_index;

pub use cup_index::{parse_cups_response, CupIndexClient, IndexedCup};
