//! Proof-of-work mining
//!
//! A block is sealed once the hex rendering of its hash begins with
//! `difficulty` `'0'` characters. Each hex character carries four bits, so the
//! expected number of attempts is 16^difficulty (4096 at the default of 3)
//! and there is no upper bound on any single search. Tests use difficulty 1
//! or 2 to keep run time predictable.

use crate::blockchain::core::chain::current_timestamp;
use crate::blockchain::{Block, HashPreimage, Sha256Hash, MAX_DIFFICULTY};
use tracing::warn;

/// True when the first `difficulty` hex digits of `hash` are all zero.
///
/// Works on raw bytes so the mining loop never renders hex. Difficulties
/// above 64 can never be met.
pub fn meets_difficulty(hash: &Sha256Hash, difficulty: usize) -> bool {
    if difficulty > MAX_DIFFICULTY {
        return false;
    }
    let full_bytes = difficulty / 2;
    if hash[..full_bytes].iter().any(|b| *b != 0) {
        return false;
    }
    difficulty % 2 == 0 || hash[full_bytes] >> 4 == 0
}

/// Same predicate over a stored hex hash.
pub fn hex_meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Scan `0..=max_nonce` for the smallest nonce whose digest meets
/// `difficulty`. `None` means the range is exhausted.
pub fn search(preimage: &HashPreimage, difficulty: usize, max_nonce: u64) -> Option<(u64, Sha256Hash)> {
    (0..=max_nonce)
        .map(|nonce| (nonce, preimage.digest(nonce)))
        .find(|(_, digest)| meets_difficulty(digest, difficulty))
}

/// Search nonces from 0 upward until the block's hash meets `difficulty`,
/// then return the block with that nonce and hash.
///
/// If every `u64` nonce fails, the timestamp is refreshed and the search
/// starts over from 0 with the new payload.
pub fn mine_block(block: Block, difficulty: usize) -> Block {
    mine_block_within(block, difficulty, u64::MAX)
}

fn mine_block_within(mut block: Block, difficulty: usize, max_nonce: u64) -> Block {
    loop {
        if let Some((nonce, digest)) = search(&block.preimage(), difficulty, max_nonce) {
            block.nonce = nonce;
            block.hash = hex::encode(digest);
            return block;
        }

        warn!(index = block.index, max_nonce, "nonce space exhausted, refreshing timestamp");
        block.timestamp = current_timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    #[test]
    fn test_meets_difficulty_on_nibbles() {
        let mut hash = [0u8; 32];
        hash[1] = 0x0f;
        assert!(meets_difficulty(&hash, 2));
        assert!(meets_difficulty(&hash, 3));
        assert!(!meets_difficulty(&hash, 4));

        hash[0] = 0x10;
        assert!(!meets_difficulty(&hash, 1));
        assert!(meets_difficulty(&hash, 0));
    }

    #[test]
    fn test_byte_and_hex_predicates_agree() {
        let hashes = [[0u8; 32], [0xffu8; 32], {
            let mut h = [0u8; 32];
            h[2] = 0x01;
            h
        }];
        for hash in &hashes {
            let hex_hash = hex::encode(hash);
            for difficulty in 0..=MAX_DIFFICULTY {
                assert_eq!(
                    meets_difficulty(hash, difficulty),
                    hex_meets_difficulty(&hex_hash, difficulty),
                    "difficulty {} on {}",
                    difficulty,
                    hex_hash
                );
            }
        }
    }

    #[test]
    fn test_impossible_difficulty() {
        assert!(!meets_difficulty(&[0u8; 32], MAX_DIFFICULTY + 1));
        assert!(!hex_meets_difficulty(&"0".repeat(64), MAX_DIFFICULTY + 1));
    }

    #[test]
    fn test_mine_block_finds_smallest_nonce() {
        let candidate = Block::new(1, vec![Transaction::new("Alice", "T1", 100.0)], "0".repeat(64));
        let sealed = mine_block(candidate.clone(), 2);

        assert!(hex_meets_difficulty(&sealed.hash, 2));
        assert_eq!(sealed.hash, sealed.compute_hash());
        assert_eq!(sealed.timestamp, candidate.timestamp);

        let preimage = candidate.preimage();
        for nonce in 0..sealed.nonce {
            assert!(!meets_difficulty(&preimage.digest(nonce), 2));
        }
    }

    #[test]
    fn test_search_returns_none_when_range_exhausted() {
        let block = Block::new(1, vec![Transaction::new("Alice", "T1", 1.0)], "0".repeat(64));
        let preimage = block.preimage();
        assert_eq!(search(&preimage, MAX_DIFFICULTY + 1, 255), None);

        let (nonce, digest) = search(&preimage, 1, u64::MAX).expect("difficulty 1 is reachable");
        assert!(meets_difficulty(&digest, 1));
        if nonce > 0 {
            assert_eq!(search(&preimage, 1, nonce - 1), None);
        }
        assert_eq!(search(&preimage, 1, nonce), Some((nonce, digest)));
    }

    #[test]
    fn test_exhausted_range_refreshes_timestamp_and_retries() {
        // A candidate whose only allowed nonce (0) misses difficulty 1.
        let candidate = loop {
            let block = Block::new(1, vec![Transaction::new("Alice", "T1", 1.0)], "0".repeat(64));
            if search(&block.preimage(), 1, 0).is_none() {
                break block;
            }
        };

        let sealed = mine_block_within(candidate.clone(), 1, 0);
        assert_eq!(sealed.nonce, 0);
        assert_ne!(sealed.timestamp, candidate.timestamp);
        assert_eq!(sealed.transactions, candidate.transactions);
        assert_eq!(sealed.hash, sealed.compute_hash());
        assert!(hex_meets_difficulty(&sealed.hash, 1));
    }
}
