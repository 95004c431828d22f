//! CLI rendering helpers

use crate::blockchain::Block;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

/// First `len` characters of a hash followed by an ellipsis.
pub fn short_hash(hash: &str, len: usize) -> String {
    if hash.len() <= len {
        hash.to_string()
    } else {
        format!("{}...", &hash[..len])
    }
}

pub fn describe_transactions(block: &Block) -> String {
    if block.transactions.is_empty() {
        return "No transactions in this block.".to_string();
    }
    block
        .transactions
        .iter()
        .map(|tx| {
            format!(
                "- Name: {}, Transaction Number: {}, Amount: {}, Date: {}, Time: {}",
                tx.name, tx.transaction_number, tx.amount, tx.date, tx.time
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the whole chain as a table, one row per block.
pub fn render_chain(blocks: &[Block]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Block",
            "Timestamp",
            "Previous Hash",
            "Hash",
            "Nonce",
            "Transactions",
        ]);

    for block in blocks {
        table.add_row(vec![
            Cell::new(format!("#{}", block.index)),
            Cell::new(&block.timestamp),
            Cell::new(short_hash(&block.previous_hash, 16)),
            Cell::new(short_hash(&block.hash, 16)),
            Cell::new(block.nonce),
            Cell::new(describe_transactions(block)),
        ]);
    }

    format!("Total Blocks: {}\n{}", blocks.len(), table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0", 16), "0");
        assert_eq!(short_hash(&"a".repeat(64), 4), "aaaa...");
    }

    #[test]
    fn test_describe_genesis() {
        let chain = Blockchain::new(1).unwrap();
        assert_eq!(describe_transactions(chain.last_block()), "No transactions in this block.");
    }

    #[test]
    fn test_render_chain_lists_every_block() {
        let mut chain = Blockchain::new(1).unwrap();
        chain.add_transaction("Bhavani", "1234", 120000.0);
        chain.mine_block();

        let rendered = render_chain(chain.chain());
        assert!(rendered.starts_with("Total Blocks: 2"));
        assert!(rendered.contains("#0"));
        assert!(rendered.contains("#1"));
        assert!(rendered.contains("Bhavani"));
    }
}
