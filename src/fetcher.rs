use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::future::try_join4;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::address::normalize_address;
use crate::config::{page_sizes, Config, DEFAULT_TOKEN_DECIMALS};
use crate::error::{AppError, Result};
use crate::types::WalletMetrics;

const SECS_PER_DAY: u64 = 86_400;

/// Reads wallet activity from a Blockscout-compatible indexer and folds it
/// into a single `WalletMetrics` record.
pub struct ActivityAggregator {
    client: reqwest::Client,
    base_url: String,
}

impl ActivityAggregator {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.indexer_api_url.clone(),
        })
    }

    /// Only a malformed address is an error. Any indexer failure yields the
    /// zeroed fallback record instead of partially filled metrics.
    pub async fn fetch_metrics(&self, address: &str) -> Result<WalletMetrics> {
        let address = normalize_address(address)?;
        match self.collect(&address).await {
            Ok(metrics) => Ok(metrics),
            Err(e) => {
                warn!(address = %address, "Indexer unavailable, using fallback metrics: {e}");
                Ok(WalletMetrics::fallback(&address))
            }
        }
    }

    async fn collect(&self, address: &str) -> Result<WalletMetrics> {
        let first_page = self.tx_list(address, Some("asc"), page_sizes::FIRST_TX).await?;
        let Some(first_tx) = first_page.first() else {
            info!(address = %address, "No transactions found, wallet has no activity");
            return Ok(WalletMetrics::empty(address));
        };
        let first_ts = tx_timestamp(first_tx)?;
        let wallet_age_days = now_secs().saturating_sub(first_ts) / SECS_PER_DAY;

        let (count_page, scan_page, tokens, native_balance) = try_join4(
            self.tx_list(address, None, page_sizes::TX_COUNT),
            self.tx_list(address, None, page_sizes::CONTRACT_SCAN),
            self.token_list(address),
            self.native_balance(address),
        )
        .await?;

        let (token_diversity, mut token_balance) = summarize_tokens(&tokens);
        if native_balance > 0.0 {
            token_balance += native_balance;
        }

        let metrics = WalletMetrics {
            tx_count: count_page.len() as u64,
            wallet_age_days,
            contract_interactions: count_contract_interactions(&scan_page),
            token_diversity,
            token_balance,
            ..WalletMetrics::empty(address)
        };
        info!(
            address = %address,
            tx_count = metrics.tx_count,
            wallet_age_days = metrics.wallet_age_days,
            contract_interactions = metrics.contract_interactions,
            token_diversity = metrics.token_diversity,
            token_balance = metrics.token_balance,
            "Wallet metrics compiled from indexer"
        );
        Ok(metrics)
    }

    async fn tx_list(&self, address: &str, sort: Option<&str>, offset: usize) -> Result<Vec<Value>> {
        let offset = offset.to_string();
        let mut query = vec![
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("page", "1"),
            ("offset", offset.as_str()),
        ];
        if let Some(sort) = sort {
            query.push(("sort", sort));
        }
        let resp = self.get_json(&self.base_url, &query).await?;
        envelope_items(&resp)
    }

    async fn token_list(&self, address: &str) -> Result<Vec<Value>> {
        let query = [("module", "account"), ("action", "tokenlist"), ("address", address)];
        let resp = self.get_json(&self.base_url, &query).await?;
        envelope_items(&resp)
    }

    /// Native coin balance in whole coins, from the v2 address-info endpoint.
    async fn native_balance(&self, address: &str) -> Result<f64> {
        let url = format!("{}/v2/addresses/{}", self.base_url, address);
        let resp = self.get_json(&url, &[]).await?;
        let balance = resp
            .get("coin_balance")
            .and_then(|b| b.as_str())
            .and_then(|s| normalize_balance(s, DEFAULT_TOKEN_DECIMALS))
            .unwrap_or(0.0);
        debug!(address = %address, native_balance = balance, "Native balance fetched");
        Ok(balance)
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = resp.json().await?;
        debug!(url = %url, ?query, "Indexer response: {body}");
        Ok(body)
    }
}

/// Unwrap the `{status, message, result}` envelope of the account module.
///
/// A non-"1" status with a list result ("No transactions found" and the like)
/// is an empty result. A non-"1" status with anything else in `result`
/// (`"NOTOK"` with "Max rate limit reached") is an indexer error.
fn envelope_items(resp: &Value) -> Result<Vec<Value>> {
    let status = resp
        .get("status")
        .and_then(|s| s.as_str())
        .ok_or_else(|| AppError::Indexer("response has no status field".to_string()))?;
    let items = resp.get("result").and_then(|r| r.as_array());
    if status == "1" {
        return items
            .cloned()
            .ok_or_else(|| AppError::Indexer("result is not a list".to_string()));
    }
    match items {
        Some(_) => Ok(Vec::new()),
        None => {
            let message = resp.get("message").and_then(|m| m.as_str()).unwrap_or("");
            let detail = match resp.get("result") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            Err(AppError::Indexer(format!("status {status} {message}: {detail}")))
        }
    }
}

fn tx_timestamp(tx: &Value) -> Result<u64> {
    tx.get("timeStamp")
        .and_then(|t| t.as_str().and_then(|s| s.parse().ok()).or_else(|| t.as_u64()))
        .ok_or_else(|| AppError::Indexer(format!("transaction has no usable timeStamp: {tx}")))
}

/// Distinct `to` addresses among transactions carrying call data. A plain
/// value transfer has empty input (`0x`).
pub fn count_contract_interactions(txs: &[Value]) -> u64 {
    let mut contracts: Vec<String> = txs
        .iter()
        .filter(|tx| {
            tx.get("input")
                .and_then(|i| i.as_str())
                .map_or(false, |i| !i.is_empty() && i != "0x")
        })
        .filter_map(|tx| tx.get("to").and_then(|t| t.as_str()))
        .filter(|to| !to.is_empty())
        .map(|to| to.to_lowercase())
        .collect();
    contracts.sort();
    contracts.dedup();
    contracts.len() as u64
}

/// Returns `(diversity, normalized balance sum)`. Entries with a non-numeric
/// balance still count toward diversity but add nothing to the sum.
pub fn summarize_tokens(tokens: &[Value]) -> (u64, f64) {
    let balance = tokens
        .iter()
        .filter_map(|token| {
            let raw = token.get("balance").and_then(|b| b.as_str())?;
            let decimals = token
                .get("decimals")
                .and_then(|d| {
                    d.as_str()
                        .and_then(|s| s.trim().parse().ok())
                        .or_else(|| d.as_u64().map(|n| n as u32))
                })
                .unwrap_or(DEFAULT_TOKEN_DECIMALS);
            let normalized = normalize_balance(raw, decimals)?;
            debug!(
                symbol = token.get("symbol").and_then(|s| s.as_str()).unwrap_or("?"),
                normalized,
                "Token balance"
            );
            Some(normalized)
        })
        .sum();
    (tokens.len() as u64, balance)
}

/// `raw / 10^decimals`. `None` when `raw` is not a finite number.
pub fn normalize_balance(raw: &str, decimals: u32) -> Option<f64> {
    let raw: f64 = raw.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
    let scale = 10u128
        .checked_pow(decimals)
        .map(|p| p as f64)
        .unwrap_or_else(|| 10f64.powi(decimals as i32));
    Some(raw / scale)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
