use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::address::normalize_address;
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::chain::ScoreCommitter;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::ActivityAggregator;
use crate::scorer::ScoreEvaluator;
use crate::types::{CommitOutcome, OrchestrationResult, Stage};

/// Every long-lived handle the pipeline needs. Built once at startup and
/// shared by reference with the request handlers.
pub struct ServiceContext {
    pub aggregator: ActivityAggregator,
    pub evaluator: ScoreEvaluator,
    pub committer: ScoreCommitter,
    pub health: HealthState,
    pub latency: LatencyStats,
}

impl ServiceContext {
    pub fn from_config(cfg: &Config) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            aggregator: ActivityAggregator::new(cfg)?,
            evaluator: ScoreEvaluator::new(cfg)?,
            committer: ScoreCommitter::new(cfg)?,
            health: HealthState::new(),
            latency: LatencyStats::new(),
        }))
    }

    /// Validate → aggregate → evaluate → commit.
    ///
    /// Only a malformed address fails the call. A failed commit is reported
    /// in `OrchestrationResult::commit` next to the computed score.
    pub async fn score_wallet(&self, address: &str) -> Result<OrchestrationResult> {
        let started = Instant::now();

        info!(address = %address, stage = %Stage::Validating, "Scoring wallet");
        let address = normalize_address(address)?;

        info!(address = %address, stage = %Stage::Aggregating, "Fetching wallet metrics");
        let metrics = self.aggregator.fetch_metrics(&address).await?;

        info!(address = %address, stage = %Stage::Evaluating, "Evaluating wallet");
        let evaluation = self.evaluator.evaluate(&metrics).await;
        self.health.record_score(metrics.is_fallback, now_ms());

        info!(address = %address, stage = %Stage::Committing, score = evaluation.score, "Committing score");
        let commit = match self.committer.commit(&address, evaluation.score).await {
            Ok(receipt) => {
                info!(address = %address, stage = %Stage::Committed, tx_hash = %receipt.transaction_hash, "Score stored on-chain");
                CommitOutcome::Committed(receipt)
            }
            Err(e) => {
                warn!(address = %address, stage = %Stage::CommitFailed, "{e}");
                CommitOutcome::Failed(e.to_string())
            }
        };
        self.health.record_commit(matches!(commit, CommitOutcome::Committed(_)));
        self.latency.record(started.elapsed());

        Ok(OrchestrationResult {
            address,
            metrics,
            evaluation,
            commit,
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
