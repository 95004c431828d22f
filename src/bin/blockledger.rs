#![forbid(unsafe_code)]
//! blockledger CLI

use blockledger::blockchain::Blockchain;
use blockledger::cli::{render_chain, short_hash};
use blockledger::config::{load_config, load_config_from};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a config file (defaults to ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured mining difficulty
    #[arg(long, global = true)]
    difficulty: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Records four sample transactions, mines them into two blocks and prints the chain
    Demo,
    /// Mines a series of single-transaction blocks and reports timing
    Bench {
        /// Number of blocks to mine
        #[arg(long, default_value_t = 5)]
        blocks: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let difficulty = cli.difficulty.unwrap_or(config.ledger.difficulty);
    let mut chain = Blockchain::new(difficulty)?;

    match cli.command {
        Commands::Demo => demo(&mut chain),
        Commands::Bench { blocks } => bench(&mut chain, blocks),
    }

    Ok(())
}

fn demo(chain: &mut Blockchain) {
    let batches = [
        [("Bhavani", "1234", 120000.0), ("Kiran", "5678", 85000.0)],
        [("Anita", "9012", 45000.0), ("Vijay", "3456", 22000.0)],
    ];

    for batch in batches {
        for (name, number, amount) in batch {
            chain.add_transaction(name, number, amount);
            println!("{} {} #{} ({})", "Transaction added:".green(), name, number, amount);
        }
        match chain.mine_block() {
            Some(block) => println!(
                "{} Block #{} mined, hash {}",
                "⛏".yellow(),
                block.index,
                short_hash(&block.hash, 20).bright_white()
            ),
            None => println!("{}", "No transactions to mine.".yellow()),
        }
    }

    println!();
    println!("{}", "======= BLOCKCHAIN LEDGER =======".bright_cyan().bold());
    println!("{}", render_chain(chain.chain()));

    match chain.verify_integrity() {
        Ok(()) => println!("{}", "Chain integrity verified.".bright_green()),
        Err(e) => println!("{} {}", "Chain integrity check failed:".red().bold(), e),
    }
}

fn bench(chain: &mut Blockchain, blocks: u64) {
    println!(
        "{}",
        format!("Mining {} blocks at difficulty {}", blocks, chain.difficulty()).bright_cyan()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let started = Instant::now();
    let mut total_attempts: u64 = 0;
    for i in 0..blocks {
        spinner.set_message(format!("block {}/{}", i + 1, blocks));
        chain.add_transaction("bench", format!("B{}", i), i as f64);
        if let Some(block) = chain.mine_block() {
            total_attempts = total_attempts.saturating_add(block.nonce.saturating_add(1));
        }
    }
    let elapsed = started.elapsed();
    spinner.finish_and_clear();

    let per_block = if blocks > 0 {
        elapsed.as_secs_f64() / blocks as f64
    } else {
        0.0
    };
    println!("Blocks mined:       {}", blocks);
    println!("Hash attempts:      {}", total_attempts);
    println!("Elapsed:            {:.3}s", elapsed.as_secs_f64());
    println!("Per block:          {:.3}s", per_block);
    println!("Chain length:       {}", chain.len());
}
