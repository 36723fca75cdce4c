//! Command-line client for a running reputation API.
//!
//! ```text
//! score-client <address>          # compute, store and print a fresh score
//! score-client --read <address>   # print the score currently on-chain
//! ```
//!
//! The API base URL comes from `API_URL` (default `http://localhost:3001`).

use std::process::ExitCode;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    address: String,
    score: u8,
    reason: String,
    transaction: Option<Transaction>,
    error: Option<String>,
    data_source: String,
    tx_count: u64,
    wallet_age: u64,
    contract_interactions: u64,
    token_diversity: u64,
    token_balance: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Transaction {
    transaction_hash: String,
    block_number: u64,
}

#[derive(Debug, Deserialize)]
struct StoredScoreResponse {
    address: String,
    score: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let read_only = match args.iter().position(|a| a == "--read") {
        Some(i) => {
            args.remove(i);
            true
        }
        None => false,
    };
    let [address] = args.as_slice() else {
        eprintln!("usage: score-client [--read] <address>");
        return ExitCode::from(2);
    };

    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());
    // Scoring waits for the on-chain confirmation, so allow well past one block.
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(180))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let url = format!("{}/score/{}", base_url.trim_end_matches('/'), address);
    let request = if read_only { client.get(&url) } else { client.post(&url) };
    let resp = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("request to {url} failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let status = resp.status();
    let body = match resp.text().await {
        Ok(b) => b,
        Err(e) => {
            eprintln!("failed reading response: {e}");
            return ExitCode::FAILURE;
        }
    };

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        eprintln!("{status}: {message}");
        return ExitCode::FAILURE;
    }

    if read_only {
        match serde_json::from_str::<StoredScoreResponse>(&body) {
            Ok(s) => println!("{}: {}", s.address, s.score),
            Err(e) => {
                eprintln!("unexpected response: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    match serde_json::from_str::<ScoreResponse>(&body) {
        Ok(r) => print_score(&r),
        Err(e) => {
            eprintln!("unexpected response: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn print_score(r: &ScoreResponse) {
    println!("Wallet:      {}", r.address);
    println!("Score:       {}", r.score);
    println!("Reason:      {}", r.reason);
    println!(
        "Metrics:     {} txs | {} days | {} contracts | {} tokens | balance {:.4} ({})",
        r.tx_count, r.wallet_age, r.contract_interactions, r.token_diversity, r.token_balance, r.data_source,
    );
    match (&r.transaction, &r.error) {
        (Some(tx), _) => println!("Stored:      {} (block {})", tx.transaction_hash, tx.block_number),
        (None, Some(err)) => println!("Not stored:  {err}"),
        (None, None) => println!("Not stored"),
    }
}
