use crate::core::cache::QuoteCache;
use crate::core::price::{PriceSource, QuoteProvider};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Resolves ticker prices through the quote cache.
///
/// Cache hits skip the provider entirely. Fetched prices are stored under
/// the ticker symbol as decimal strings with the configured TTL; failed
/// fetches are not stored, so the next run retries. A per-run memo keeps
/// the upstream at one call per distinct ticker, failures included.
pub struct CachingPriceResolver<T: QuoteProvider> {
    inner: T,
    cache: Arc<dyn QuoteCache>,
    ttl: Duration,
    memo: Mutex<HashMap<String, Option<Decimal>>>,
}

impl<T: QuoteProvider> CachingPriceResolver<T> {
    pub fn new(inner: T, cache: Arc<dyn QuoteCache>, ttl: Duration) -> Self {
        Self {
            inner,
            cache,
            ttl,
            memo: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<T: QuoteProvider + Send + Sync> PriceSource for CachingPriceResolver<T> {
    async fn resolve(&self, ticker: &str) -> Option<Decimal> {
        if ticker.is_empty() {
            return None;
        }

        let mut memo = self.memo.lock().await;
        if let Some(known) = memo.get(ticker) {
            debug!("Run memo hit for ticker: {ticker}");
            return *known;
        }

        if let Some(stored) = self.cache.get(ticker).await {
            match Decimal::from_str(&stored) {
                Ok(price) => {
                    memo.insert(ticker.to_string(), Some(price));
                    return Some(price);
                }
                Err(e) => {
                    // Unreadable entries degrade to a miss and get replaced.
                    warn!("Discarding unreadable cache entry for {ticker}: {e}");
                    self.cache.remove(ticker).await;
                }
            }
        }

        let resolved = match self.inner.fetch_price(ticker).await {
            Ok(quote) => {
                self.cache
                    .put(ticker, quote.price.to_string(), Some(self.ttl))
                    .await;
                Some(quote.price)
            }
            Err(e) => {
                warn!("No quote for {ticker}: {e}");
                None
            }
        };

        memo.insert(ticker.to_string(), resolved);
        resolved
    }
}
