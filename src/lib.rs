//! blockledger - An append-only proof-of-work transaction ledger
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, canonical hashing, the chain and its validation
//! - [`transaction`] - Transaction records
//! - [`mempool`] - Pending transaction buffer
//!
//! ## Consensus
//! - [`miner`] - Proof-of-work search
//!
//! ## Serving
//! - [`node`] - Shared, lock-guarded ledger handle
//! - `api` - JSON HTTP API (feature `api`)
//! - [`cli`] - CLI rendering
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;

// ============================================================================
// Serving
// ============================================================================
pub mod node;

#[cfg(feature = "api")]
pub mod api;

pub mod cli;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use blockchain::{Block, Blockchain};
pub use error::{LedgerError, Result};
pub use transaction::Transaction;
