//! Error types for blockledger

use thiserror::Error;

/// Ledger errors.
///
/// Mining an empty pending buffer is not an error; it is reported as `None`
/// by [`crate::blockchain::Blockchain::mine_block`]. The integrity variants
/// below describe corruption and are not recoverable.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid genesis block: {0}")]
    InvalidGenesis(String),

    #[error("Invalid block linkage at index {index}")]
    InvalidBlockLinkage { index: u64 },

    #[error("Hash mismatch at block {index}: stored {stored}, computed {computed}")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("Invalid proof of work at block {index} (difficulty {difficulty})")]
    InvalidProofOfWork { index: u64, difficulty: usize },

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Mining task failed: {0}")]
    MiningTask(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
