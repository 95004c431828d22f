//! REST API for blockledger
//!
//! A thin JSON front end over [`Node`]: submit transactions, mine, reset and
//! read the chain. Input coercion (numeric amounts, non-empty names) happens
//! here so the ledger itself can take its arguments as given.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Request, State,
    },
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::Block;
use crate::error::LedgerError;
use crate::node::{LedgerStats, Node};
use crate::transaction::Transaction;

/// State shared by every handler.
#[derive(Clone)]
pub struct ApiState {
    pub node: Node,
    api_stats: Arc<Mutex<ApiStats>>,
}

impl ApiState {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            api_stats: Arc::new(Mutex::new(ApiStats::new())),
        }
    }
}

#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    InvalidInput(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Amount as submitted: a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    fn coerce(&self) -> Result<f64, ApiError> {
        let amount = match self {
            AmountInput::Number(n) => *n,
            AmountInput::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ApiError::InvalidInput(format!("Amount must be numeric, got {:?}", s)))?,
        };
        if !amount.is_finite() {
            return Err(ApiError::InvalidInput("Amount must be a finite number".to_string()));
        }
        Ok(amount)
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub name: String,
    pub transaction_number: String,
    pub amount: AmountInput,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub message: String,
    pub block_index: u64,
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub mined: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
}

#[derive(Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub uptime_seconds: u64,
    #[serde(flatten)]
    pub ledger: LedgerStats,
}

#[derive(Serialize)]
struct SuccessResponse {
    message: String,
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    state.api_stats.lock().record_request(response.status().is_success());
    response
}

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints.
pub fn build_api_router(node: Node) -> Router {
    let state = ApiState::new(node);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        // Chain endpoints
        .route("/chain", get(get_chain))
        .route("/chain/validate", get(validate_chain))
        .route("/block/:index", get(get_block))
        // Transaction endpoints
        .route("/transaction", post(submit_transaction))
        .route("/pending", get(get_pending))
        // Ledger mutation
        .route("/mine", post(mine_block))
        .route("/reset", post(reset_chain))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        // logging before stats so timing covers the stats update
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), stats_middleware))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn run_api_server(node: Node, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "API server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_chain(State(state): State<ApiState>) -> Json<ChainResponse> {
    let chain = state.node.chain().await;
    Json(ChainResponse {
        length: chain.len(),
        chain,
    })
}

async fn validate_chain(State(state): State<ApiState>) -> Json<ValidationResponse> {
    match state.node.validate().await {
        Ok(()) => Json(ValidationResponse {
            valid: true,
            error: None,
        }),
        Err(e) => Json(ValidationResponse {
            valid: false,
            error: Some(e.to_string()),
        }),
    }
}

async fn get_block(
    State(state): State<ApiState>,
    index: Result<Path<u64>, PathRejection>,
) -> Result<Json<Block>, ApiError> {
    let Path(index) = index?;
    state
        .node
        .block(index)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Block {} not found", index)))
}

async fn get_pending(State(state): State<ApiState>) -> Json<PendingResponse> {
    let transactions = state.node.pending_transactions().await;
    Json(PendingResponse {
        count: transactions.len(),
        transactions,
    })
}

async fn submit_transaction(
    State(state): State<ApiState>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let Json(req) = payload?;
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Name must not be empty".to_string()));
    }
    let amount = req.amount.coerce()?;

    let block_index = state
        .node
        .add_transaction(name, req.transaction_number.trim().to_string(), amount)
        .await;

    Ok(Json(TransactionResponse {
        message: format!("Transaction will be added to block {}", block_index),
        block_index,
    }))
}

async fn mine_block(State(state): State<ApiState>) -> Result<Json<MineResponse>, ApiError> {
    let response = match state.node.mine_block().await? {
        Some(block) => MineResponse {
            mined: true,
            message: format!("Block #{} mined successfully", block.index),
            block: Some(block),
        },
        None => MineResponse {
            mined: false,
            message: "No transactions to mine".to_string(),
            block: None,
        },
    };
    Ok(Json(response))
}

async fn reset_chain(State(state): State<ApiState>) -> Json<SuccessResponse> {
    state.node.reset_chain().await;
    Json(SuccessResponse {
        message: "Blockchain has been reset".to_string(),
    })
}

async fn get_api_stats(State(state): State<ApiState>) -> Json<ApiStatsResponse> {
    let ledger = state.node.stats().await;
    let stats = state.api_stats.lock();
    let uptime = stats.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0);

    Json(ApiStatsResponse {
        total_requests: stats.total_requests,
        successful_requests: stats.successful_requests,
        failed_requests: stats.failed_requests,
        uptime_seconds: uptime,
        ledger,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_coercion() {
        assert_eq!(AmountInput::Number(12.5).coerce().unwrap(), 12.5);
        assert_eq!(AmountInput::Text(" 120000 ".to_string()).coerce().unwrap(), 120000.0);
        assert!(matches!(
            AmountInput::Text("ten".to_string()).coerce(),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            AmountInput::Text("NaN".to_string()).coerce(),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_amount_input_accepts_number_or_string() {
        let req: TransactionRequest =
            serde_json::from_str(r#"{"name":"Alice","transaction_number":"T1","amount":"100"}"#).unwrap();
        assert!(matches!(req.amount, AmountInput::Text(_)));
        let req: TransactionRequest =
            serde_json::from_str(r#"{"name":"Alice","transaction_number":"T1","amount":100}"#).unwrap();
        assert!(matches!(req.amount, AmountInput::Number(_)));
    }
}
