use crate::blockchain::core::chain::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::LedgerError;
use crate::miner::hex_meets_difficulty;

pub fn validate_block_hash(block: &Block) -> Result<(), LedgerError> {
    let computed = block.compute_hash();
    if computed != block.hash {
        return Err(LedgerError::HashMismatch {
            index: block.index,
            stored: block.hash.clone(),
            computed,
        });
    }
    Ok(())
}

pub fn validate_genesis(block: &Block) -> Result<(), LedgerError> {
    if !block.is_genesis() {
        return Err(LedgerError::InvalidGenesis(format!("index is {}, expected 0", block.index)));
    }
    if block.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(LedgerError::InvalidGenesis(format!(
            "previous hash is {:?}, expected {:?}",
            block.previous_hash, GENESIS_PREVIOUS_HASH
        )));
    }
    if !block.transactions.is_empty() {
        return Err(LedgerError::InvalidGenesis(format!(
            "holds {} transactions, expected none",
            block.transactions.len()
        )));
    }
    validate_block_hash(block)
}

/// Check `block` as the direct successor of `previous`.
pub fn validate_successor(previous: &Block, block: &Block, difficulty: usize) -> Result<(), LedgerError> {
    if block.index != previous.index + 1 {
        return Err(LedgerError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous.index + 1,
            block.index
        )));
    }

    if block.previous_hash != previous.hash {
        return Err(LedgerError::InvalidBlockLinkage { index: block.index });
    }

    if block.transactions.is_empty() {
        return Err(LedgerError::InvalidBlock(format!("Block {} has no transactions.", block.index)));
    }

    validate_block_hash(block)?;

    if !hex_meets_difficulty(&block.hash, difficulty) {
        return Err(LedgerError::InvalidProofOfWork {
            index: block.index,
            difficulty,
        });
    }
    Ok(())
}

/// Validate a whole chain, genesis first. Any error means the chain is corrupt.
pub fn validate_chain(blocks: &[Block], difficulty: usize) -> Result<(), LedgerError> {
    let genesis = blocks
        .first()
        .ok_or_else(|| LedgerError::InvalidGenesis("chain is empty".to_string()))?;
    if let Err(e) = validate_genesis(genesis) {
        tracing::warn!(error = %e, "genesis block check failed");
        return Err(e);
    }

    for pair in blocks.windows(2) {
        if let Err(e) = validate_successor(&pair[0], &pair[1], difficulty) {
            tracing::warn!(error = %e, "chain integrity check failed");
            return Err(e);
        }
    }
    Ok(())
}
