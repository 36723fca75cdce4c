//! In-process stand-ins for the indexer and the scoring model.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// EIP-55 reference address, already in checksummed form.
pub const WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const DAY: u64 = 86_400;

#[derive(Debug, Clone, Default)]
pub struct FakeChain {
    /// Ascending by timestamp.
    pub txs: Vec<Value>,
    pub tokens: Vec<Value>,
    /// Wei, as the v2 endpoint reports it.
    pub coin_balance: Option<String>,
    pub fail_token_list: bool,
    /// Answer `tokenlist` with the `NOTOK` rate-limit envelope.
    pub rate_limit_token_list: bool,
    /// Answer `txlist` with the `NOTOK` rate-limit envelope.
    pub rate_limit_tx_list: bool,
}

impl FakeChain {
    /// `tx_count` transactions, the first `age_secs` ago. All but the last call
    /// one of three contracts; the last is a plain transfer. Holds two tokens
    /// (0.2 + 0.1) and 0.2 native, for a total balance of 0.5.
    pub fn active(tx_count: usize, age_secs: u64) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let first = now - age_secs;
        let txs = (0..tx_count)
            .map(|i| {
                let plain = i + 1 == tx_count;
                let (to, input) = if plain {
                    ("0x000000000000000000000000000000000000bEEF".to_string(), "0x")
                } else {
                    (format!("0x{:040x}", 0xC0 + i % 3), "0xa9059cbb")
                };
                json!({
                    "hash": format!("0x{i:064x}"),
                    "timeStamp": (first + i as u64 * 60).to_string(),
                    "to": to,
                    "input": input,
                })
            })
            .collect();
        Self {
            txs,
            tokens: vec![
                json!({"symbol": "tRIF", "balance": "200000000000000000", "decimals": "18"}),
                json!({"symbol": "tUSD", "balance": "100000", "decimals": "6"}),
            ],
            coin_balance: Some("200000000000000000".to_string()),
            fail_token_list: false,
            rate_limit_token_list: false,
            rate_limit_tx_list: false,
        }
    }
}

/// Serve `router` on an ephemeral local port; returns `http://127.0.0.1:<port>`.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Returns the indexer base URL (ending in `/api`).
pub async fn spawn_fake_indexer(chain: FakeChain) -> String {
    let router = Router::new()
        .route("/api", get(account_module))
        .route("/api/v2/addresses/:address", get(address_info))
        .with_state(Arc::new(chain));
    format!("{}/api", spawn(router).await)
}

async fn account_module(
    State(chain): State<Arc<FakeChain>>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    match q.get("action").map(String::as_str) {
        Some("txlist") if chain.rate_limit_tx_list => Json(rate_limited()).into_response(),
        Some("txlist") => {
            let offset = q.get("offset").and_then(|o| o.parse().ok()).unwrap_or(10_000);
            let page: Vec<Value> = chain.txs.iter().take(offset).cloned().collect();
            Json(envelope(page, "No transactions found")).into_response()
        }
        Some("tokenlist") if chain.fail_token_list => StatusCode::BAD_GATEWAY.into_response(),
        Some("tokenlist") if chain.rate_limit_token_list => Json(rate_limited()).into_response(),
        Some("tokenlist") => Json(envelope(chain.tokens.clone(), "No tokens found")).into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn address_info(
    State(chain): State<Arc<FakeChain>>,
    Path(address): Path<String>,
) -> Json<Value> {
    Json(json!({"hash": address, "coin_balance": chain.coin_balance}))
}

fn rate_limited() -> Value {
    json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"})
}

fn envelope(items: Vec<Value>, empty_message: &str) -> Value {
    if items.is_empty() {
        json!({"status": "0", "message": empty_message, "result": []})
    } else {
        json!({"status": "1", "message": "OK", "result": items})
    }
}

/// What the fake model answers with.
#[derive(Debug, Clone)]
pub enum ModelReply {
    Content(String),
    Status(StatusCode),
}

/// Returns the chat completions URL.
pub async fn spawn_fake_model(reply: ModelReply) -> String {
    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completion))
        .with_state(Arc::new(reply));
    format!("{}/v1/chat/completions", spawn(router).await)
}

async fn chat_completion(State(reply): State<Arc<ModelReply>>, Json(_body): Json<Value>) -> Response {
    match reply.as_ref() {
        ModelReply::Content(content) => Json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        }))
        .into_response(),
        ModelReply::Status(status) => (*status, "upstream error").into_response(),
    }
}
