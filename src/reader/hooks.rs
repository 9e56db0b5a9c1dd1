//! Ready-made column parsers for [`Reader::with_column_parser`](super::Reader::with_column_parser).

use crate::error::HookError;

/// Trim surrounding whitespace.
pub fn trim(value: &str) -> Result<String, HookError> {
    Ok(value.trim().to_string())
}

/// Trim whitespace, then strip one pair of wrapping double quotes.
pub fn clean(value: &str) -> Result<String, HookError> {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        Ok(trimmed[1..trimmed.len() - 1].to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean("  \"2024/12/22\" ").unwrap(), "2024/12/22");
        assert_eq!(clean("\"").unwrap(), "\"");
        assert_eq!(clean(" plain ").unwrap(), "plain");
    }

    #[test]
    fn test_trim_keeps_quotes() {
        assert_eq!(trim(" \"x\" ").unwrap(), "\"x\"");
    }
}
