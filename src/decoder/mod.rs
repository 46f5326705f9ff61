//! Function selector to contract method name.

/// Returned for selectors not in [`KNOWN_SELECTORS`].
pub const UNKNOWN_METHOD: &str = "unknown";

/// Length of a `0x`-prefixed 4-byte selector.
const SELECTOR_LEN: usize = 10;

/// Selectors of the benchmarked token and swap contracts.
pub const KNOWN_SELECTORS: &[(&str, &str)] = &[
    ("0x095ea7b3", "approve"),
    ("0xa9059cbb", "transfer"),
    ("0x23b872dd", "transferFrom"),
    ("0x51c6590a", "addLiquidity"),
    ("0x9c8f9f23", "removeLiquidity"),
    ("0x26ef80c9", "token0To1"),
    ("0xad3bd45c", "token1To0"),
    ("0xa5843f08", "init"),
    ("0xaa6ca808", "getTokens"),
];

/// Decode the method name from transaction input data (or a bare selector).
pub fn decode(input: &str) -> &'static str {
    let Some(selector) = input.get(..SELECTOR_LEN) else {
        return UNKNOWN_METHOD;
    };
    KNOWN_SELECTORS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(selector))
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_METHOD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known() {
        assert_eq!(
            decode("0x095ea7b30000000000000000000000001234567890abcdef"),
            "approve"
        );
        assert_eq!(decode("0xa9059cbb"), "transfer");
        assert_eq!(decode("0xAD3BD45C00"), "token1To0");
    }

    #[test]
    fn test_decode_unknown() {
        assert_eq!(decode("0xdeadbeef00"), UNKNOWN_METHOD);
        assert_eq!(decode("0x"), UNKNOWN_METHOD);
        assert_eq!(decode(""), UNKNOWN_METHOD);
    }
}
