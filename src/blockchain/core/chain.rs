use crate::error::{LedgerError, Result};
use crate::mempool::Mempool;
use crate::miner::mine_block;
use crate::transaction::Transaction;
use chrono::Local;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

pub type Sha256Hash = [u8; 32];

/// `previous_hash` of every genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub(crate) fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The canonical hash input of a block with the nonce left open.
///
/// The canonical form is compact JSON with sorted keys:
/// `{"index":..,"nonce":..,"previous_hash":..,"timestamp":..,"transactions":[..]}`.
/// Everything before the nonce is absorbed into a SHA-256 state once and
/// everything after it is kept as bytes, so each nonce costs one state clone
/// and two updates.
#[derive(Clone)]
pub struct HashPreimage {
    prefix: Sha256,
    suffix: Vec<u8>,
}

impl HashPreimage {
    pub fn new(index: u64, timestamp: &str, transactions: &[Transaction], previous_hash: &str) -> Self {
        let mut prefix = Sha256::new();
        prefix.update(format!("{{\"index\":{},\"nonce\":", index).as_bytes());

        let transactions = Value::Array(transactions.iter().map(Transaction::canonical_value).collect());
        let suffix = format!(
            ",\"previous_hash\":{},\"timestamp\":{},\"transactions\":{}}}",
            Value::from(previous_hash),
            Value::from(timestamp),
            transactions
        )
        .into_bytes();

        HashPreimage { prefix, suffix }
    }

    pub fn digest(&self, nonce: u64) -> Sha256Hash {
        let mut buf = [0u8; 20];
        let mut hasher = self.prefix.clone();
        hasher.update(write_decimal(nonce, &mut buf));
        hasher.update(&self.suffix);
        hasher.finalize().into()
    }
}

fn write_decimal(mut n: u64, buf: &mut [u8; 20]) -> &[u8] {
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    &buf[pos..]
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

impl Block {
    /// Build a block with nonce 0 and a provisional hash. Mining replaces
    /// both before the block is appended to a chain.
    pub fn new(index: u64, transactions: Vec<Transaction>, previous_hash: impl Into<String>) -> Self {
        let mut block = Block {
            index,
            timestamp: current_timestamp(),
            transactions,
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn genesis() -> Self {
        Block::new(0, Vec::new(), GENESIS_PREVIOUS_HASH)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn preimage(&self) -> HashPreimage {
        HashPreimage::new(self.index, &self.timestamp, &self.transactions, &self.previous_hash)
    }

    /// Lowercase hex SHA-256 of the block's canonical form.
    pub fn compute_hash(&self) -> String {
        hex::encode(self.preimage().digest(self.nonce))
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

pub const DEFAULT_DIFFICULTY: usize = 3;
/// A SHA-256 digest has 64 hex characters.
pub const MAX_DIFFICULTY: usize = 64;

/// The ledger: a non-empty chain of sealed blocks plus the pending buffer.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    difficulty: usize,
    mempool: Mempool,
}

impl Default for Blockchain {
    fn default() -> Self {
        Blockchain {
            blocks: vec![Block::genesis()],
            difficulty: DEFAULT_DIFFICULTY,
            mempool: Mempool::new(),
        }
    }
}

impl Blockchain {
    /// Create a ledger holding only a fresh genesis block.
    pub fn new(difficulty: usize) -> Result<Self> {
        if difficulty == 0 || difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::Config(format!(
                "difficulty must be between 1 and {}, got {}",
                MAX_DIFFICULTY, difficulty
            )));
        }

        Ok(Blockchain {
            difficulty,
            ..Default::default()
        })
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn chain(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a ledger holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> &Block {
        // Construction and reset both leave the genesis block in place.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.mempool.get_all_transactions()
    }

    /// Queue a transaction for the next block and return that block's index.
    pub fn add_transaction(
        &mut self,
        name: impl Into<String>,
        transaction_number: impl Into<String>,
        amount: f64,
    ) -> u64 {
        let tx = Transaction::new(name, transaction_number, amount);
        debug!(
            name = %tx.name,
            transaction_number = %tx.transaction_number,
            amount = tx.amount,
            "transaction added"
        );
        self.mempool.add_transaction(tx);
        self.last_block().index + 1
    }

    /// Seal every pending transaction into a new block.
    ///
    /// Returns `None` without touching any state when nothing is pending.
    pub fn mine_block(&mut self) -> Option<Block> {
        if self.mempool.is_empty() {
            debug!("no transactions to mine");
            return None;
        }

        let (index, previous_hash) = {
            let last = self.last_block();
            (last.index + 1, last.hash.clone())
        };
        let candidate = Block::new(index, self.mempool.take_all(), previous_hash);
        let block = mine_block(candidate, self.difficulty);

        info!(
            index = block.index,
            nonce = block.nonce,
            transactions = block.transactions.len(),
            hash = %block.hash,
            "block mined"
        );
        self.blocks.push(block.clone());
        Some(block)
    }

    /// Drop every block and pending transaction and start over from a new
    /// genesis block.
    pub fn reset_chain(&mut self) {
        self.blocks.clear();
        self.mempool.clear();
        self.blocks.push(Block::genesis());
        info!("blockchain has been reset");
    }

    /// Re-check hashes, links and proof-of-work across the whole chain.
    pub fn verify_integrity(&self) -> Result<()> {
        super::validation::validate_chain(&self.blocks, self.difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miner::hex_meets_difficulty;
    use serde_json::json;

    #[test]
    fn test_write_decimal() {
        let mut buf = [0u8; 20];
        assert_eq!(write_decimal(0, &mut buf), b"0");
        assert_eq!(write_decimal(4096, &mut buf), b"4096");
        assert_eq!(write_decimal(u64::MAX, &mut buf), b"18446744073709551615");
    }

    #[test]
    fn test_hash_matches_sorted_json_document() {
        let mut block = Block::new(
            7,
            vec![Transaction::new("Alice", "T1", 100.0), Transaction::new("Bob", "T2", 50.5)],
            "ab".repeat(32),
        );
        block.nonce = 1234;

        let document = json!({
            "index": block.index,
            "nonce": block.nonce,
            "previous_hash": block.previous_hash,
            "timestamp": block.timestamp,
            "transactions": block.transactions.iter().map(Transaction::canonical_value).collect::<Vec<_>>(),
        });
        let expected = hex::encode(Sha256::digest(document.to_string().as_bytes()));

        assert_eq!(block.compute_hash(), expected);
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        let a = Transaction::new("Alice", "T1", 100.0);
        let b = Transaction::new("Bob", "T2", 50.0);
        let mut first = Block::new(1, vec![a.clone(), b.clone()], "0");
        let mut second = first.clone();
        second.transactions = vec![b, a];
        first.hash = first.compute_hash();
        second.hash = second.compute_hash();
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_nonce_changes_hash() {
        let mut block = Block::genesis();
        let before = block.compute_hash();
        block.nonce = 1;
        assert_ne!(before, block.compute_hash());
    }

    #[test]
    fn test_genesis_shape() {
        let chain = Blockchain::new(1).unwrap();
        assert_eq!(chain.len(), 1);
        let genesis = chain.last_block();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.transactions.is_empty());
        assert!(genesis.has_valid_hash());
        assert_eq!(genesis.hash.len(), 64);
    }

    #[test]
    fn test_rejects_out_of_range_difficulty() {
        assert!(matches!(Blockchain::new(0), Err(LedgerError::Config(_))));
        assert!(matches!(Blockchain::new(65), Err(LedgerError::Config(_))));
        assert_eq!(Blockchain::default().difficulty(), DEFAULT_DIFFICULTY);
    }

    #[test]
    fn test_add_transaction_only_touches_buffer() {
        let mut chain = Blockchain::new(1).unwrap();
        let next = chain.add_transaction("Alice", "T1", 100.0);
        assert_eq!(next, 1);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.pending_transactions().len(), 1);
    }

    #[test]
    fn test_mine_seals_pending_in_order() {
        let mut chain = Blockchain::new(2).unwrap();
        let genesis_hash = chain.last_block().hash.clone();
        chain.add_transaction("Alice", "T1", 100.0);
        chain.add_transaction("Bob", "T2", 50.0);

        let block = chain.mine_block().expect("pending transactions should be mined");
        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis_hash);
        assert!(hex_meets_difficulty(&block.hash, 2));
        assert!(block.has_valid_hash());
        let numbers: Vec<_> = block.transactions.iter().map(|t| t.transaction_number.as_str()).collect();
        assert_eq!(numbers, ["T1", "T2"]);

        assert_eq!(chain.len(), 2);
        assert!(chain.pending_transactions().is_empty());
        assert_eq!(chain.last_block(), &block);
    }

    #[test]
    fn test_mine_empty_buffer_is_noop() {
        let mut chain = Blockchain::new(1).unwrap();
        let before = chain.chain().to_vec();
        assert!(chain.mine_block().is_none());
        assert!(chain.mine_block().is_none());
        assert_eq!(chain.chain(), before.as_slice());
    }

    #[test]
    fn test_reset_restores_fresh_genesis() {
        let mut chain = Blockchain::new(1).unwrap();
        let first_genesis = chain.last_block().clone();
        chain.add_transaction("Alice", "T1", 100.0);
        chain.mine_block();
        chain.add_transaction("Bob", "T2", 50.0);
        std::thread::sleep(std::time::Duration::from_millis(2));

        chain.reset_chain();
        assert_eq!(chain.len(), 1);
        assert!(chain.pending_transactions().is_empty());
        let genesis = chain.last_block();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(genesis.transactions.is_empty());
        assert_ne!(genesis.timestamp, first_genesis.timestamp);
        assert_ne!(genesis.hash, first_genesis.hash);
    }

    #[test]
    fn test_verify_integrity_after_mining() {
        let mut chain = Blockchain::new(1).unwrap();
        for i in 0..3 {
            chain.add_transaction("Carol", format!("T{}", i), i as f64);
            chain.mine_block();
        }
        assert!(chain.verify_integrity().is_ok());
    }
}
