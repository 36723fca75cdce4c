//! Ordered read strategy for the on-chain score.
//!
//! Some deployments of the oracle expose the score through `getReputation`,
//! others only through the public `reputation` mapping getter. Reads walk
//! `READ_ORDER` and stop at the first accessor that answers.

use std::fmt::Display;
use std::future::Future;

use tracing::{info, warn};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAccessor {
    /// `getReputation(address) view returns (uint256)`
    GetReputation,
    /// `reputation(address) view returns (uint256)`, the mapping getter.
    Reputation,
}

impl ReadAccessor {
    pub fn name(self) -> &'static str {
        match self {
            ReadAccessor::GetReputation => "getReputation",
            ReadAccessor::Reputation => "reputation",
        }
    }
}

pub const READ_ORDER: [ReadAccessor; 2] = [ReadAccessor::GetReputation, ReadAccessor::Reputation];

/// Try each accessor in `order`; `ReadFailed` carries every failure when none
/// succeeds.
pub async fn read_in_order<F, Fut, E>(order: &[ReadAccessor], mut call: F) -> Result<u64>
where
    F: FnMut(ReadAccessor) -> Fut,
    Fut: Future<Output = std::result::Result<u64, E>>,
    E: Display,
{
    let mut failures = Vec::with_capacity(order.len());
    for &accessor in order {
        match call(accessor).await {
            Ok(score) => {
                if !failures.is_empty() {
                    info!(accessor = accessor.name(), "Score read via secondary accessor");
                }
                return Ok(score);
            }
            Err(e) => {
                warn!(accessor = accessor.name(), "Read accessor failed: {e}");
                failures.push(format!("{}: {e}", accessor.name()));
            }
        }
    }
    if failures.is_empty() {
        return Err(AppError::ReadFailed("no read accessors configured".to_string()));
    }
    Err(AppError::ReadFailed(failures.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn primary_accessor_comes_first() {
        assert_eq!(READ_ORDER[0], ReadAccessor::GetReputation);
        assert_eq!(READ_ORDER[1], ReadAccessor::Reputation);
    }

    #[tokio::test]
    async fn primary_success_skips_secondary() {
        let tried = Mutex::new(Vec::new());
        let score = read_in_order(&READ_ORDER, |a| {
            tried.lock().unwrap().push(a);
            async move { Ok::<u64, String>(42) }
        })
        .await
        .unwrap();
        assert_eq!(score, 42);
        assert_eq!(*tried.lock().unwrap(), vec![ReadAccessor::GetReputation]);
    }

    #[tokio::test]
    async fn primary_error_falls_through_to_mapping() {
        let tried = Mutex::new(Vec::new());
        let score = read_in_order(&READ_ORDER, |a| {
            tried.lock().unwrap().push(a);
            async move {
                match a {
                    ReadAccessor::GetReputation => Err("execution reverted".to_string()),
                    ReadAccessor::Reputation => Ok(67),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(score, 67);
        assert_eq!(*tried.lock().unwrap(), READ_ORDER.to_vec());
    }

    #[tokio::test]
    async fn both_failing_is_read_failed() {
        let err = read_in_order(&READ_ORDER, |a| async move {
            Err::<u64, String>(format!("{} missing", a.name()))
        })
        .await
        .unwrap_err();
        match err {
            AppError::ReadFailed(msg) => {
                assert!(msg.contains("getReputation missing"));
                assert!(msg.contains("reputation missing"));
            }
            other => panic!("expected ReadFailed, got {other:?}"),
        }
    }
}
