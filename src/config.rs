use std::time::Duration;

use crate::error::{AppError, Result};

pub const BLOCKSCOUT_API_URL: &str = "https://rootstock-testnet.blockscout.com/api";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const ROOTSTOCK_TESTNET_RPC: &str = "https://public-node.testnet.rsk.co";

/// Rootstock testnet.
pub const DEFAULT_CHAIN_ID: u64 = 31;

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Indexer page sizes (the `offset` query parameter).
pub mod page_sizes {
    /// First transaction only, used to detect wallet age.
    pub const FIRST_TX: usize = 1;
    /// Upper bound on the transaction count we report.
    pub const TX_COUNT: usize = 1000;
    /// Window scanned for contract interactions.
    pub const CONTRACT_SCAN: usize = 100;
}

/// Decimals assumed for a token entry that does not report any.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// Scoring model call parameters.
pub mod model {
    pub const TEMPERATURE: f64 = 0.7;
    pub const MAX_TOKENS: u32 = 300;
}

/// Heuristic applied when the model is unreachable or its reply is unusable.
pub mod fallback_score {
    pub const ACTIVE_SCORE: u8 = 78;
    pub const ACTIVE_REASON: &str = "active user with diverse contract usage and good age";
    pub const INACTIVE_REASON: &str = "no on-chain activity";
}

/// Overrides for the score write. Rootstock only accepts legacy transactions.
pub mod gas {
    pub const LIMIT: u64 = 1_000_000;
    /// 0.06 gwei.
    pub const PRICE_WEI: u64 = 60_000_000;
}

/// Polling interval while waiting for the score write to be mined.
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api_port: u16,
    /// Browser origin allowed by CORS (CORS_ORIGIN)
    pub cors_origin: String,
    /// Blockscout-compatible indexer base, ending in `/api` (BLOCKSCOUT_API_URL)
    pub indexer_api_url: String,
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_model: String,
    /// JSON-RPC endpoint (ROOTSTOCK_TESTNET_RPC)
    pub rpc_url: String,
    pub chain_id: u64,
    /// Hex signing key. Commits are disabled when unset.
    pub private_key: Option<String>,
    /// ReputationOracle address. `None` when unset or the zero address.
    pub oracle_address: Option<String>,
    /// Timeout applied to every indexer and model request.
    pub http_timeout: Duration,
    /// Timeout covering send + confirmation of a score write.
    pub commit_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("PORT must be a valid port number".to_string()))?,
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            indexer_api_url: std::env::var("BLOCKSCOUT_API_URL")
                .unwrap_or_else(|_| BLOCKSCOUT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| OPENAI_API_URL.to_string()),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4".to_string()),
            rpc_url: std::env::var("ROOTSTOCK_TESTNET_RPC")
                .unwrap_or_else(|_| ROOTSTOCK_TESTNET_RPC.to_string()),
            chain_id: std::env::var("CHAIN_ID")
                .unwrap_or_else(|_| DEFAULT_CHAIN_ID.to_string())
                .parse::<u64>()
                .map_err(|_| AppError::Config("CHAIN_ID must be an integer".to_string()))?,
            private_key: non_empty_var("PRIVATE_KEY"),
            oracle_address: non_empty_var("REPUTATION_ORACLE_ADDRESS")
                .filter(|a| !a.eq_ignore_ascii_case(ZERO_ADDRESS)),
            http_timeout: Duration::from_secs(
                std::env::var("HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse::<u64>()
                    .unwrap_or(30),
            ),
            commit_timeout: Duration::from_secs(
                std::env::var("COMMIT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse::<u64>()
                    .unwrap_or(120),
            ),
        })
    }

    /// Defaults with no model key, signer or contract. Tests override the
    /// URLs they need.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            log_level: "debug".to_string(),
            api_port: 0,
            cors_origin: "http://localhost:3000".to_string(),
            indexer_api_url: "http://127.0.0.1:1/api".to_string(),
            openai_api_key: None,
            openai_api_url: "http://127.0.0.1:1/v1/chat/completions".to_string(),
            openai_model: "gpt-4".to_string(),
            rpc_url: "http://127.0.0.1:1".to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            private_key: None,
            oracle_address: None,
            http_timeout: Duration::from_secs(2),
            commit_timeout: Duration::from_secs(2),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
