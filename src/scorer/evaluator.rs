use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{fallback_score, model, Config};
use crate::error::{AppError, Result};
use crate::types::{ScoreResult, WalletMetrics};

const SYSTEM_PROMPT: &str = "You are a blockchain reputation scoring system. \
    You analyze wallet activity and provide a reputation score from 0-100.";

/// Turns wallet metrics into a 0-100 score via an OpenAI-compatible chat
/// completion endpoint, with a fixed heuristic whenever the model can't be used.
pub struct ScoreEvaluator {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

/// The only reply shape we accept from the model.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelVerdict {
    score: u64,
    reason: String,
}

impl ScoreEvaluator {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.http_timeout)
            .build()?;
        Ok(Self {
            http,
            api_url: cfg.openai_api_url.clone(),
            api_key: cfg.openai_api_key.clone(),
            model: cfg.openai_model.clone(),
        })
    }

    /// Never fails: an unreachable model or an unusable reply degrades to
    /// `heuristic_score`.
    pub async fn evaluate(&self, metrics: &WalletMetrics) -> ScoreResult {
        if !metrics.has_activity() {
            info!(address = %metrics.address, "No on-chain activity, score is 0");
            return inactive();
        }

        let prompt = build_prompt(metrics);
        debug!(address = %metrics.address, "Scoring prompt:\n{prompt}");

        let outcome = match self.complete(&prompt).await {
            Ok(content) => parse_reply(&content),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(result) => {
                info!(address = %metrics.address, score = result.score, "Model scored wallet");
                result
            }
            Err(e) => {
                let result = heuristic_score(metrics);
                warn!(
                    address = %metrics.address,
                    score = result.score,
                    "Scoring model unusable, applying heuristic: {e}"
                );
                result
            }
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Model("OPENAI_API_KEY not configured".to_string()))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": model::TEMPERATURE,
            "max_tokens": model::MAX_TOKENS
        });

        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AppError::Model(format!("backend returned {}", resp.status())));
        }

        let json: serde_json::Value = resp.json().await?;
        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or("");
        if content.is_empty() {
            return Err(AppError::Model("empty completion".to_string()));
        }
        debug!("Model reply: {content}");
        Ok(content.to_string())
    }
}

/// Deterministic prompt; identical metrics always give identical text.
pub fn build_prompt(metrics: &WalletMetrics) -> String {
    format!(
        "You're an AI reputation engine. Based on the following wallet data, \
         return a score from 0 to 100 with a reason.\n\
         \n\
         - Tx count: {}\n\
         - Wallet age: {} days\n\
         - Contract interactions: {}\n\
         - Token balance: {} RBTC\n\
         - Suspicious activity: {}\n\
         \n\
         Respond only with JSON, exactly two fields:\n\
         {{\"score\": <number>, \"reason\": \"<explanation>\"}}\n",
        metrics.tx_count,
        metrics.wallet_age_days,
        metrics.contract_interactions,
        metrics.token_balance,
        metrics.suspicious_activity,
    )
}

/// Strict parse: exactly `score` and `reason`, score within [0, 100],
/// reason non-empty.
pub fn parse_reply(content: &str) -> Result<ScoreResult> {
    let verdict: ModelVerdict = serde_json::from_str(content.trim())?;
    let score = u8::try_from(verdict.score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| AppError::Model(format!("score {} out of range", verdict.score)))?;
    let reason = verdict.reason.trim();
    if reason.is_empty() {
        return Err(AppError::Model("empty reason".to_string()));
    }
    Ok(ScoreResult {
        score,
        reason: reason.to_string(),
    })
}

pub fn heuristic_score(metrics: &WalletMetrics) -> ScoreResult {
    if metrics.tx_count > 0 {
        ScoreResult {
            score: fallback_score::ACTIVE_SCORE,
            reason: fallback_score::ACTIVE_REASON.to_string(),
        }
    } else {
        inactive()
    }
}

fn inactive() -> ScoreResult {
    ScoreResult {
        score: 0,
        reason: fallback_score::INACTIVE_REASON.to_string(),
    }
}
