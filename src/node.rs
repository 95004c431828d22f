//! Shared ledger handle
//!
//! One `Blockchain` per process, owned by a `Node` and handed to whatever
//! serves requests. All access goes through a single `RwLock`: intake, mining
//! and reset take the write lock, reads take the read lock. Mining runs on the
//! blocking pool and keeps the write lock for the whole nonce search, so
//! transactions submitted meanwhile wait and land in the next block, and a
//! reset can never interleave with a mine.

use crate::blockchain::{Block, Blockchain};
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Clone)]
pub struct Node {
    blockchain: Arc<RwLock<Blockchain>>,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    transactions_submitted: AtomicU64,
    blocks_mined: AtomicU64,
    empty_mines: AtomicU64,
    resets: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerStats {
    pub chain_length: usize,
    pub pending_transactions: usize,
    pub difficulty: usize,
    pub last_block_hash: String,
    pub transactions_submitted: u64,
    pub blocks_mined: u64,
    pub empty_mines: u64,
    pub resets: u64,
}

impl Node {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            blockchain: Arc::new(RwLock::new(blockchain)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Queue a transaction; returns the index of the block it will land in.
    pub async fn add_transaction(&self, name: String, transaction_number: String, amount: f64) -> u64 {
        let mut chain = self.blockchain.write().await;
        let index = chain.add_transaction(name, transaction_number, amount);
        self.counters.transactions_submitted.fetch_add(1, Ordering::Relaxed);
        index
    }

    /// Mine the pending buffer. `Ok(None)` means there was nothing to mine.
    ///
    /// The search runs to completion on the blocking pool even if this future
    /// is dropped; counters are bumped there, under the write lock.
    pub async fn mine_block(&self) -> Result<Option<Block>> {
        let blockchain = self.blockchain.clone();
        let counters = self.counters.clone();
        tokio::task::spawn_blocking(move || {
            let mut chain = blockchain.blocking_write();
            let mined = chain.mine_block();
            match &mined {
                Some(_) => counters.blocks_mined.fetch_add(1, Ordering::Relaxed),
                None => counters.empty_mines.fetch_add(1, Ordering::Relaxed),
            };
            mined
        })
        .await
        .map_err(|e| LedgerError::MiningTask(e.to_string()))
    }

    pub async fn reset_chain(&self) {
        self.blockchain.write().await.reset_chain();
        self.counters.resets.fetch_add(1, Ordering::Relaxed);
        info!("ledger reset through node handle");
    }

    /// Snapshot of the chain.
    pub async fn chain(&self) -> Vec<Block> {
        self.blockchain.read().await.chain().to_vec()
    }

    pub async fn block(&self, index: u64) -> Option<Block> {
        let chain = self.blockchain.read().await;
        usize::try_from(index).ok().and_then(|i| chain.chain().get(i).cloned())
    }

    pub async fn last_block(&self) -> Block {
        self.blockchain.read().await.last_block().clone()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.blockchain.read().await.pending_transactions().to_vec()
    }

    pub async fn validate(&self) -> Result<()> {
        self.blockchain.read().await.verify_integrity()
    }

    pub async fn stats(&self) -> LedgerStats {
        let chain = self.blockchain.read().await;
        LedgerStats {
            chain_length: chain.len(),
            pending_transactions: chain.pending_transactions().len(),
            difficulty: chain.difficulty(),
            last_block_hash: chain.last_block().hash.clone(),
            transactions_submitted: self.counters.transactions_submitted.load(Ordering::Relaxed),
            blocks_mined: self.counters.blocks_mined.load(Ordering::Relaxed),
            empty_mines: self.counters.empty_mines.load(Ordering::Relaxed),
            resets: self.counters.resets.load(Ordering::Relaxed),
        }
    }
}
