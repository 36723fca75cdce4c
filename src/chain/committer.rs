use std::sync::Arc;
use std::time::Duration;

use ethers::prelude::*;
use tracing::{info, warn};

use crate::address::{normalize_address, parse_address};
use crate::chain::accessor::{read_in_order, ReadAccessor, READ_ORDER};
use crate::config::{gas, Config, RECEIPT_POLL_INTERVAL_MS};
use crate::error::{AppError, Result};
use crate::types::CommitReceipt;

abigen!(
    ReputationOracle,
    r#"[
        function storeReputation(address user, uint256 score)
        function getReputation(address user) external view returns (uint256)
        function reputation(address) external view returns (uint256)
    ]"#
);

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Writes scores to and reads them from the ReputationOracle contract.
///
/// Reads need only the contract address; writes also need a signing key.
/// Either half may be absent, in which case the matching operation fails
/// with `ReadFailed` / `CommitFailed` instead of the service refusing to start.
pub struct ScoreCommitter {
    reader: Option<ReputationOracle<Provider<Http>>>,
    writer: Option<ReputationOracle<SignerClient>>,
    read_timeout: Duration,
    commit_timeout: Duration,
}

impl ScoreCommitter {
    pub fn new(cfg: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(cfg.rpc_url.as_str())
            .map_err(|e| AppError::Config(format!("invalid RPC url {}: {e}", cfg.rpc_url)))?
            .interval(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS));

        let contract_address = cfg
            .oracle_address
            .as_deref()
            .map(|a| {
                a.parse::<Address>()
                    .map_err(|_| AppError::Config(format!("invalid REPUTATION_ORACLE_ADDRESS: {a}")))
            })
            .transpose()?;

        let wallet = cfg
            .private_key
            .as_deref()
            .map(|k| {
                k.parse::<LocalWallet>()
                    .map(|w| w.with_chain_id(cfg.chain_id))
                    .map_err(|_| AppError::Config("PRIVATE_KEY is not a valid hex key".to_string()))
            })
            .transpose()?;

        let reader = contract_address.map(|a| ReputationOracle::new(a, Arc::new(provider.clone())));
        let writer = match (contract_address, wallet) {
            (Some(a), Some(w)) => {
                let client = Arc::new(SignerMiddleware::new(provider, w));
                Some(ReputationOracle::new(a, client))
            }
            _ => None,
        };

        Ok(Self {
            reader,
            writer,
            read_timeout: cfg.http_timeout,
            commit_timeout: cfg.commit_timeout,
        })
    }

    pub fn can_read(&self) -> bool {
        self.reader.is_some()
    }

    pub fn can_commit(&self) -> bool {
        self.writer.is_some()
    }

    /// Submit `storeReputation(address, score)` and wait until it is mined.
    /// Each call is a separate write.
    pub async fn commit(&self, address: &str, score: u8) -> Result<CommitReceipt> {
        let user = parse_address(&normalize_address(address)?)?;
        let contract = self.writer.as_ref().ok_or_else(|| {
            AppError::CommitFailed("signing key or contract binding not configured".to_string())
        })?;

        info!(address = %address, score, "Storing score on-chain");
        let call = contract
            .store_reputation(user, U256::from(score))
            .legacy()
            .gas(gas::LIMIT)
            .gas_price(gas::PRICE_WEI);

        let receipt = tokio::time::timeout(self.commit_timeout, send_and_confirm(&call))
            .await
            .map_err(|_| {
                AppError::CommitFailed(format!("not mined within {}s", self.commit_timeout.as_secs()))
            })??;

        let receipt = confirmed_receipt(&receipt)?;
        info!(
            tx_hash = %receipt.transaction_hash,
            block = receipt.block_number,
            "Score transaction confirmed"
        );
        Ok(receipt)
    }

    /// Current on-chain score, trying each accessor in `READ_ORDER`.
    pub async fn read_score(&self, address: &str) -> Result<u64> {
        let user = parse_address(&normalize_address(address)?)?;
        let contract = self
            .reader
            .as_ref()
            .ok_or_else(|| AppError::ReadFailed("contract not configured".to_string()))?;
        let timeout = self.read_timeout;

        read_in_order(&READ_ORDER, |accessor| async move {
            let call = match accessor {
                ReadAccessor::GetReputation => contract.get_reputation(user),
                ReadAccessor::Reputation => contract.reputation(user),
            };
            let value = tokio::time::timeout(timeout, call.call())
                .await
                .map_err(|_| format!("timed out after {}s", timeout.as_secs()))?
                .map_err(|e| e.to_string())?;
            if value > U256::from(u64::MAX) {
                return Err(format!("score {value} does not fit in u64"));
            }
            Ok::<u64, String>(value.as_u64())
        })
        .await
    }
}

/// A mined receipt that did not revert and names its block.
fn confirmed_receipt(receipt: &TransactionReceipt) -> Result<CommitReceipt> {
    if receipt.status == Some(U64::zero()) {
        return Err(AppError::CommitFailed(format!(
            "transaction {:?} reverted",
            receipt.transaction_hash
        )));
    }
    let block_number = receipt
        .block_number
        .ok_or_else(|| AppError::CommitFailed("receipt has no block number".to_string()))?
        .as_u64();
    Ok(CommitReceipt {
        transaction_hash: format!("{:?}", receipt.transaction_hash),
        block_number,
    })
}

async fn send_and_confirm(call: &ContractCall<SignerClient, ()>) -> Result<TransactionReceipt> {
    let pending = call
        .send()
        .await
        .map_err(|e| AppError::CommitFailed(e.to_string()))?;
    info!(tx_hash = ?pending.tx_hash(), "Transaction sent");

    match pending.await {
        Ok(Some(receipt)) => Ok(receipt),
        Ok(None) => Err(AppError::CommitFailed("transaction dropped from mempool".to_string())),
        Err(e) => {
            warn!("Waiting for confirmation failed: {e}");
            Err(AppError::CommitFailed(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::WALLET;

    // Well-known development key; never funded on a real network.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ORACLE: &str = "0xABd3c4b7D19b4bb2fe8edfe0Cae9e8BCfefA558f";

    #[tokio::test]
    async fn commit_without_signer_is_commit_failed() {
        let mut cfg = Config::for_tests();
        cfg.oracle_address = Some(ORACLE.to_string());
        let committer = ScoreCommitter::new(&cfg).unwrap();
        assert!(committer.can_read());
        assert!(!committer.can_commit());

        let err = committer.commit(WALLET, 78).await.unwrap_err();
        assert!(matches!(err, AppError::CommitFailed(_)));
    }

    #[tokio::test]
    async fn read_without_contract_is_read_failed() {
        let committer = ScoreCommitter::new(&Config::for_tests()).unwrap();
        let err = committer.read_score(WALLET).await.unwrap_err();
        assert!(matches!(err, AppError::ReadFailed(_)));
    }

    #[tokio::test]
    async fn unreachable_rpc_fails_commit_and_both_reads() {
        let mut cfg = Config::for_tests();
        cfg.oracle_address = Some(ORACLE.to_string());
        cfg.private_key = Some(DEV_KEY.to_string());
        let committer = ScoreCommitter::new(&cfg).unwrap();
        assert!(committer.can_commit());

        let err = committer.commit(WALLET, 78).await.unwrap_err();
        assert!(matches!(err, AppError::CommitFailed(_)));

        match committer.read_score(WALLET).await.unwrap_err() {
            AppError::ReadFailed(msg) => {
                assert!(msg.contains("getReputation"));
                assert!(msg.contains("reputation:"));
            }
            other => panic!("expected ReadFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_address_rejected_before_rpc() {
        let committer = ScoreCommitter::new(&Config::for_tests()).unwrap();
        assert!(matches!(
            committer.commit("0xnope", 10).await,
            Err(AppError::InvalidAddress(_))
        ));
        assert!(matches!(
            committer.read_score("0xnope").await,
            Err(AppError::InvalidAddress(_))
        ));
    }

    fn mined(status: u64, block: Option<u64>) -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: H256::repeat_byte(0xab),
            status: Some(U64::from(status)),
            block_number: block.map(U64::from),
            ..Default::default()
        }
    }

    #[test]
    fn successful_receipt_carries_hash_and_block() {
        let receipt = confirmed_receipt(&mined(1, Some(6_123_456))).unwrap();
        assert_eq!(receipt.block_number, 6_123_456);
        assert_eq!(receipt.transaction_hash, format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn reverted_receipt_is_commit_failed() {
        match confirmed_receipt(&mined(0, Some(6_123_456))) {
            Err(AppError::CommitFailed(msg)) => assert!(msg.contains("reverted")),
            other => panic!("expected CommitFailed, got {other:?}"),
        }
    }

    #[test]
    fn receipt_without_block_is_commit_failed() {
        match confirmed_receipt(&mined(1, None)) {
            Err(AppError::CommitFailed(msg)) => assert!(msg.contains("no block number")),
            other => panic!("expected CommitFailed, got {other:?}"),
        }
    }

    #[test]
    fn bad_key_is_config_error() {
        let mut cfg = Config::for_tests();
        cfg.private_key = Some("not-a-key".to_string());
        assert!(matches!(ScoreCommitter::new(&cfg), Err(AppError::Config(_))));
    }
}
