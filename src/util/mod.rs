//! Shared utilities.

use crate::error::{Error, Result};

/// Wei per ETH.
pub const WEI_PER_ETH: f64 = 1e18;

/// Parse a `0x`-prefixed (or bare) hex quantity. Returns None on empty or non-hex input.
pub fn parse_hex_quantity(s: &str) -> Option<u128> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, 16).ok()
}

pub fn wei_to_eth(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETH
}

/// Arithmetic mean of `samples`. Empty input is rejected rather than yielding NaN.
pub fn mean(label: &str, samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(Error::EmptyDataset(label.to_string()));
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Lowercase transaction hash with a `0x` prefix.
pub fn normalize_tx_hash(tx_hash: &str) -> String {
    let h = tx_hash.trim().to_ascii_lowercase();
    if h.starts_with("0x") {
        h
    } else {
        format!("0x{}", h)
    }
}

/// Hex digits in a transaction hash.
const TX_HASH_HEX_LEN: usize = 64;

/// Normalized hash if `tx_hash` is `0x` plus 64 hex digits (prefix optional).
pub fn parse_tx_hash(tx_hash: &str) -> Option<String> {
    let h = normalize_tx_hash(tx_hash);
    let digits = &h[2..];
    let valid = digits.len() == TX_HASH_HEX_LEN && digits.bytes().all(|b| b.is_ascii_hexdigit());
    valid.then_some(h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x0"), Some(0));
        assert_eq!(parse_hex_quantity("0x5208"), Some(21_000));
        assert_eq!(parse_hex_quantity("3b9aca00"), Some(1_000_000_000));
        assert_eq!(parse_hex_quantity("0x"), None);
        assert_eq!(parse_hex_quantity("0xzz"), None);
    }

    #[test]
    fn test_wei_to_eth() {
        assert_eq!(wei_to_eth(1_000_000_000_000_000_000), 1.0);
        assert!((wei_to_eth(1_000_000_000) - 1e-9).abs() < 1e-21);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean("a", &[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert!(matches!(mean("a", &[]), Err(Error::EmptyDataset(l)) if l == "a"));
    }

    #[test]
    fn test_normalize_tx_hash() {
        assert_eq!(normalize_tx_hash("ABC123"), "0xabc123");
        assert_eq!(normalize_tx_hash(" 0xDEF456 "), "0xdef456");
    }

    #[test]
    fn test_parse_tx_hash() {
        let full = format!("0x{}", "Ab".repeat(32));
        assert_eq!(parse_tx_hash(&full), Some(full.to_ascii_lowercase()));
        assert_eq!(
            parse_tx_hash(&"0".repeat(64)),
            Some(format!("0x{}", "0".repeat(64)))
        );
        assert_eq!(parse_tx_hash("0xabc"), None);
        assert_eq!(parse_tx_hash(&format!("0x{}", "g".repeat(64))), None);
        assert_eq!(parse_tx_hash(""), None);
    }
}
