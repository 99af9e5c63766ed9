use crate::error::{Error, Result};

/// Parse a byte pattern such as `"48 8D 0D ?? ?? ?? ??"`.
///
/// `??` and `?` are wildcards. Tokens longer than two characters are read as
/// consecutive bytes, so `"F30F5C15"` equals `"F3 0F 5C 15"`.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        if token.len() % 2 != 0 {
            return Err(Error::InvalidPattern(format!(
                "odd-length token '{}' in '{}'",
                token, pattern
            )));
        }

        for i in (0..token.len()).step_by(2) {
            let pair = token.get(i..i + 2).ok_or_else(|| {
                Error::InvalidPattern(format!("non-ASCII token '{}' in '{}'", token, pattern))
            })?;
            if pair == "??" {
                bytes.push(None);
                continue;
            }
            let value = u8::from_str_radix(pair, 16).map_err(|e| {
                Error::InvalidPattern(format!("invalid token '{}': {}", token, e))
            })?;
            bytes.push(Some(value));
        }
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPattern("pattern is empty".to_string()));
    }

    Ok(bytes)
}

/// Compare bytes read from memory against a parsed pattern
pub fn pattern_matches(actual: &[u8], expected: &[Option<u8>]) -> bool {
    actual.len() >= expected.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(want, got)| want.is_none_or(|w| w == *got))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let bytes = parse_pattern("48 8D 0D ?? ?? ?? ??").unwrap();
        assert_eq!(bytes.len(), 7);
        assert_eq!(bytes[0], Some(0x48));
        assert_eq!(bytes[1], Some(0x8D));
        assert_eq!(bytes[2], Some(0x0D));
        assert_eq!(bytes[3], None);
    }

    #[test]
    fn test_parse_pattern_packed_tokens() {
        assert_eq!(
            parse_pattern("F30F5C15").unwrap(),
            parse_pattern("F3 0F 5C 15").unwrap()
        );
        assert_eq!(parse_pattern("AB??CD").unwrap(), vec![Some(0xAB), None, Some(0xCD)]);
    }

    #[test]
    fn test_parse_pattern_rejects_garbage() {
        assert!(parse_pattern("").is_err());
        assert!(parse_pattern("   ").is_err());
        assert!(parse_pattern("4").is_err());
        assert!(parse_pattern("ZZ").is_err());
        assert!(parse_pattern("é1").is_err());
    }

    #[test]
    fn test_pattern_matches() {
        let pattern = parse_pattern("44 0F ?? C7").unwrap();
        assert!(pattern_matches(&[0x44, 0x0F, 0x2F, 0xC7], &pattern));
        assert!(pattern_matches(&[0x44, 0x0F, 0x00, 0xC7, 0x90], &pattern));
        assert!(!pattern_matches(&[0x44, 0x0F, 0x2F, 0xC8], &pattern));
        assert!(!pattern_matches(&[0x44, 0x0F], &pattern));
    }
}
