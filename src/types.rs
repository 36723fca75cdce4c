use serde::Serialize;

// ---------------------------------------------------------------------------
// Wallet metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuspiciousActivity {
    No,
    Yes,
}

impl std::fmt::Display for SuspiciousActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuspiciousActivity::No => write!(f, "No"),
            SuspiciousActivity::Yes => write!(f, "Yes"),
        }
    }
}

/// Activity summary for one wallet. Either fully populated from the indexer
/// or entirely zero; never a mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMetrics {
    pub address: String,
    pub tx_count: u64,
    #[serde(rename = "walletAge")]
    pub wallet_age_days: u64,
    pub contract_interactions: u64,
    pub token_diversity: u64,
    pub token_balance: f64,
    pub suspicious_activity: SuspiciousActivity,
    pub is_fallback: bool,
}

impl WalletMetrics {
    /// A wallet the indexer knows nothing about. Not degraded.
    pub fn empty(address: &str) -> Self {
        Self {
            address: address.to_string(),
            tx_count: 0,
            wallet_age_days: 0,
            contract_interactions: 0,
            token_diversity: 0,
            token_balance: 0.0,
            suspicious_activity: SuspiciousActivity::No,
            is_fallback: false,
        }
    }

    /// Degraded record used when the indexer could not be read.
    pub fn fallback(address: &str) -> Self {
        Self {
            is_fallback: true,
            ..Self::empty(address)
        }
    }

    pub fn has_activity(&self) -> bool {
        self.tx_count > 0 || self.contract_interactions > 0 || self.token_diversity > 0
    }

    pub fn data_source(&self) -> DataSource {
        if self.is_fallback {
            DataSource::Fallback
        } else {
            DataSource::Blockscout
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Blockscout,
    Fallback,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Score in [0, 100] with a non-empty explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreResult {
    pub score: u8,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// On-chain commit
// ---------------------------------------------------------------------------

/// Built only from a mined receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(CommitReceipt),
    Failed(String),
}

impl CommitOutcome {
    pub fn receipt(&self) -> Option<&CommitReceipt> {
        match self {
            CommitOutcome::Committed(r) => Some(r),
            CommitOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CommitOutcome::Committed(_) => None,
            CommitOutcome::Failed(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Per-request pipeline stage, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Aggregating,
    Evaluating,
    Committing,
    Committed,
    CommitFailed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Validating => "validating",
            Stage::Aggregating => "aggregating",
            Stage::Evaluating => "evaluating",
            Stage::Committing => "committing",
            Stage::Committed => "committed",
            Stage::CommitFailed => "commit_failed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub address: String,
    pub metrics: WalletMetrics,
    pub evaluation: ScoreResult,
    pub commit: CommitOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_serialize_with_front_end_field_names() {
        let mut m = WalletMetrics::empty("0xabc");
        m.wallet_age_days = 30;
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["walletAge"], 30);
        assert_eq!(v["txCount"], 0);
        assert_eq!(v["suspiciousActivity"], "No");
        assert_eq!(v["isFallback"], false);
    }

    #[test]
    fn fallback_is_zeroed_and_flagged() {
        let m = WalletMetrics::fallback("0xabc");
        assert!(m.is_fallback);
        assert!(!m.has_activity());
        assert_eq!(m.token_balance, 0.0);
        assert_eq!(m.data_source(), DataSource::Fallback);
        assert_eq!(WalletMetrics::empty("0xabc").data_source(), DataSource::Blockscout);
    }
}
