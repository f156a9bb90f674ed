//! Known-symbols validation
//!
//! Loads the list of listed companies the service supports and answers
//! "is this a tradable instrument?" for the API layer, with suggestions for
//! near misses.

use sentiment_core::{Symbol, SymbolValidator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymbolListError {
    #[error("Failed to read symbol list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse symbol list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One listed company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StockInfo {
    pub symbol: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KnownSymbols {
    stocks: Vec<StockInfo>,
    index: HashSet<String>,
}

impl KnownSymbols {
    pub fn from_stocks(stocks: Vec<StockInfo>) -> Self {
        let index = stocks.iter().map(|s| s.symbol.trim().to_uppercase()).collect();
        Self { stocks, index }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SymbolListError> {
        let stocks: Vec<StockInfo> = serde_json::from_str(json)?;
        Ok(Self::from_stocks(stocks))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SymbolListError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Load the list, or fall back to an empty list (which recognizes every
    /// well-formed symbol) when the file is missing or malformed.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(known) => {
                tracing::info!("Loaded {} known symbols from {}", known.len(), path.display());
                known
            }
            Err(e) => {
                tracing::warn!(
                    "Symbol list unavailable at {} ({}); accepting any well-formed symbol",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn stocks(&self) -> &[StockInfo] {
        &self.stocks
    }

    pub fn stock_info(&self, symbol: &str) -> Option<&StockInfo> {
        let wanted = symbol.trim().to_uppercase();
        self.stocks.iter().find(|s| s.symbol.trim().to_uppercase() == wanted)
    }

    /// Stocks whose symbol or name contains `partial`, case-insensitively.
    pub fn matching(&self, partial: &str, limit: usize) -> Vec<&StockInfo> {
        let needle = partial.trim().to_uppercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.stocks
            .iter()
            .filter(|s| s.symbol.to_uppercase().contains(&needle) || s.name.to_uppercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

impl SymbolValidator for KnownSymbols {
    fn is_recognized(&self, symbol: &Symbol) -> bool {
        self.index.is_empty() || self.index.contains(symbol.as_str())
    }

    fn suggestions(&self, partial: &str, limit: usize) -> Vec<String> {
        self.matching(partial, limit)
            .into_iter()
            .map(|s| format!("{} ({})", s.symbol, s.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"symbol": "TCS", "name": "Tata Consultancy Services", "exchange": "NSE"},
        {"symbol": "INFY", "name": "Infosys"},
        {"symbol": "TATAMOTORS", "name": "Tata Motors", "sector": "Automobile"},
        {"symbol": "HDFCBANK", "name": "HDFC Bank"}
    ]"#;

    fn known() -> KnownSymbols {
        KnownSymbols::from_json_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_recognizes_listed_symbols() {
        let known = known();
        assert_eq!(known.len(), 4);
        assert!(known.is_recognized(&Symbol::parse("tcs").unwrap()));
        assert!(!known.is_recognized(&Symbol::parse("AAPL").unwrap()));
    }

    #[test]
    fn test_empty_list_accepts_everything() {
        let known = KnownSymbols::default();
        assert!(known.is_recognized(&Symbol::parse("ANYTHING").unwrap()));
    }

    #[test]
    fn test_stock_info_lookup() {
        let known = known();
        let info = known.stock_info(" tatamotors ").unwrap();
        assert_eq!(info.name, "Tata Motors");
        assert_eq!(info.sector.as_deref(), Some("Automobile"));
        assert!(known.stock_info("WIPRO").is_none());
    }

    #[test]
    fn test_suggestions_match_symbol_or_name() {
        let known = known();
        assert_eq!(
            known.suggestions("tata", 5),
            vec!["TCS (Tata Consultancy Services)", "TATAMOTORS (Tata Motors)"]
        );
        assert_eq!(known.suggestions("bank", 5), vec!["HDFCBANK (HDFC Bank)"]);
        assert_eq!(known.suggestions("tata", 1).len(), 1);
        assert!(known.suggestions("", 5).is_empty());
    }

    #[test]
    fn test_missing_file_falls_back_to_empty() {
        let known = KnownSymbols::load_or_empty("/definitely/not/here.json");
        assert!(known.is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            KnownSymbols::from_json_str("{\"symbol\": 1}"),
            Err(SymbolListError::Parse(_))
        ));
    }
}
