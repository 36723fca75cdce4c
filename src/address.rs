//! Wallet address validation. Runs before any network I/O.

use ethers::types::Address;
use ethers::utils::to_checksum;

use crate::error::{AppError, Result};

/// Validate a candidate address and return its EIP-55 checksummed form.
///
/// Accepts `0x` + 40 hex digits. A body that is entirely lower- or
/// upper-case is taken as-is; a mixed-case body must carry a valid checksum.
pub fn normalize_address(candidate: &str) -> Result<String> {
    let invalid = || AppError::InvalidAddress(candidate.to_string());

    let body = candidate
        .strip_prefix("0x")
        .or_else(|| candidate.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    if body.len() != 40 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let address: Address = body.parse().map_err(|_| invalid())?;
    let checksummed = to_checksum(&address, None);

    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && &checksummed[2..] != body {
        return Err(invalid());
    }

    Ok(checksummed)
}

/// Parse an already-normalized address into the contract binding type.
pub fn parse_address(normalized: &str) -> Result<Address> {
    normalized
        .parse::<Address>()
        .map_err(|_| AppError::InvalidAddress(normalized.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn lowercase_is_normalized_to_checksum() {
        let out = normalize_address(&CHECKSUMMED.to_lowercase()).unwrap();
        assert_eq!(out, CHECKSUMMED);
    }

    #[test]
    fn valid_checksum_passes() {
        assert_eq!(normalize_address(CHECKSUMMED).unwrap(), CHECKSUMMED);
    }

    #[test]
    fn broken_checksum_rejected() {
        // Flip the case of one letter.
        let bad = CHECKSUMMED.replacen("aAeb", "aaeb", 1);
        assert!(matches!(normalize_address(&bad), Err(AppError::InvalidAddress(_))));
    }

    #[test]
    fn malformed_inputs_rejected() {
        for s in [
            "",
            "0x",
            "5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAe",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAedd",
            "0xZZAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "not-an-address",
        ] {
            assert!(
                matches!(normalize_address(s), Err(AppError::InvalidAddress(_))),
                "expected rejection for {s:?}"
            );
        }
    }
}
