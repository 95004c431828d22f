#![forbid(unsafe_code)]
//! API server for blockledger

use blockledger::api::run_api_server;
use blockledger::blockchain::Blockchain;
use blockledger::config::load_config;
use blockledger::node::Node;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let addr = config.server.socket_addr()?;

    let blockchain = Blockchain::new(config.ledger.difficulty)?;
    info!(
        difficulty = blockchain.difficulty(),
        genesis = %blockchain.last_block().hash,
        "ledger initialized"
    );

    run_api_server(Node::new(blockchain), addr).await
}
