//! Stock symbol validation and normalization

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FinnhubError;

/// Maximum accepted symbol length after trimming.
const MAX_SYMBOL_LEN: usize = 10;

/// A validated, normalized ticker symbol.
///
/// Construction trims surrounding whitespace and uppercases the input.
/// Accepted symbols are non-empty, at most 10 characters, and either
/// purely alphanumeric or carrying an exchange-style `.` or `-`
/// separator (e.g. `BRK.B`, `BF-B`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockSymbol(String);

impl StockSymbol {
    /// Validate and normalize a raw symbol string.
    ///
    /// Error messages echo the caller's original input, not the
    /// normalized form.
    pub fn parse(input: &str) -> Result<Self, FinnhubError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FinnhubError::InvalidArgument(
                "Stock symbol is required and cannot be empty".to_string(),
            ));
        }

        let symbol = trimmed.to_uppercase();
        let alphanumeric = symbol.chars().all(|c| c.is_alphanumeric());
        if !alphanumeric && !symbol.contains('.') && !symbol.contains('-') {
            return Err(FinnhubError::InvalidArgument(format!(
                "Invalid stock symbol format: {input}"
            )));
        }

        if symbol.chars().count() > MAX_SYMBOL_LEN {
            return Err(FinnhubError::InvalidArgument(format!(
                "Stock symbol too long: {input}"
            )));
        }

        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StockSymbol {
    type Err = FinnhubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_uppercases() {
        let symbol = StockSymbol::parse("  aapl  ").unwrap();
        assert_eq!(symbol.as_str(), "AAPL");
    }

    #[test]
    fn test_parse_accepts_exchange_separators() {
        assert_eq!(StockSymbol::parse("BRK.B").unwrap().as_str(), "BRK.B");
        assert_eq!(StockSymbol::parse("bf-b").unwrap().as_str(), "BF-B");
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        let err = StockSymbol::parse("").unwrap_err();
        assert!(err
            .to_string()
            .contains("Stock symbol is required and cannot be empty"));

        let err = StockSymbol::parse("   ").unwrap_err();
        assert!(err
            .to_string()
            .contains("Stock symbol is required and cannot be empty"));
    }

    #[test]
    fn test_parse_rejects_invalid_characters() {
        let err = StockSymbol::parse("AA PL").unwrap_err();
        assert!(err.to_string().contains("Invalid stock symbol format"));

        let err = StockSymbol::parse("AAPL!").unwrap_err();
        assert!(err.to_string().contains("Invalid stock symbol format"));
    }

    #[test]
    fn test_parse_rejects_overlong_symbols() {
        let err = StockSymbol::parse("ABCDEFGHIJK").unwrap_err();
        assert!(err.to_string().contains("Stock symbol too long: ABCDEFGHIJK"));

        // Exactly at the limit is fine.
        assert!(StockSymbol::parse("ABCDEFGHIJ").is_ok());
    }

    #[test]
    fn test_error_messages_echo_original_input() {
        let err = StockSymbol::parse("toolongsymbol").unwrap_err();
        assert!(err.to_string().contains("toolongsymbol"));
    }

    #[test]
    fn test_from_str_round_trip() {
        let symbol: StockSymbol = "msft".parse().unwrap();
        assert_eq!(symbol.to_string(), "MSFT");
    }
}
