//! Pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// A single market quote for a ticker symbol.
///
/// `price` is always positive; providers reject non-positive closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub ticker: String,
    pub price: Decimal,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetches the latest closing price for `ticker` from the upstream
    /// market data service. Returns an error when the upstream has no data
    /// for the symbol; callers treat that as "no price", not as a failure.
    async fn fetch_price(&self, ticker: &str) -> Result<Quote>;
}

/// Resolves a ticker symbol to a unit price, or `None` when no quote is
/// obtainable (empty ticker, provider failure, malformed upstream data).
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn resolve(&self, ticker: &str) -> Option<Decimal>;
}
