//! Hex address parsing and formatting.

use anyhow::{Result, anyhow};

/// Parse a hex address string (with or without 0x prefix)
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let digits = s
        .trim()
        .strip_prefix("0x")
        .or_else(|| s.trim().strip_prefix("0X"))
        .unwrap_or(s.trim());
    u64::from_str_radix(digits, 16).map_err(|e| anyhow!("Invalid hex address '{}': {}", s, e))
}

/// Format an address as a hex string with 0x prefix
pub fn format_hex_address(addr: u64) -> String {
    format!("0x{:X}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_address_with_prefix() {
        assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("0X1000").unwrap(), 0x1000);
    }

    #[test]
    fn test_parse_hex_address_without_prefix() {
        assert_eq!(parse_hex_address("14A0").unwrap(), 0x14A0);
        assert_eq!(parse_hex_address(" 140000000 ").unwrap(), 0x1_4000_0000);
    }

    #[test]
    fn test_parse_hex_address_invalid() {
        assert!(parse_hex_address("0x").is_err());
        assert!(parse_hex_address("0x0x10").is_err());
        assert!(parse_hex_address("vtable").is_err());
    }

    #[test]
    fn test_format_hex_address() {
        assert_eq!(format_hex_address(0xABC0), "0xABC0");
        assert_eq!(format_hex_address(0), "0x0");
    }
}
