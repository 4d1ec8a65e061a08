use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::price::{Quote, QuoteProvider};

// AlphaVantageProvider implementation for QuoteProvider
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        AlphaVantageProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct DailySeriesResponse {
    // Absent on error payloads; Alpha Vantage reports failures with a 200
    // status and a "Note"/"Error Message" body instead.
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyBar>>,
}

#[derive(Deserialize, Debug)]
struct DailyBar {
    // Closing price as a decimal string, parsed without a float round trip.
    #[serde(rename = "4. close")]
    close: String,
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    #[instrument(
        name = "AlphaVantageFetch",
        skip(self),
        fields(ticker = %ticker)
    )]
    async fn fetch_price(&self, ticker: &str) -> Result<Quote> {
        let url = format!(
            "{}/query?function=TIME_SERIES_DAILY&symbol={}&apikey={}",
            self.base_url, ticker, self.api_key
        );
        debug!("Requesting daily series from {}", url);

        let client = reqwest::Client::builder().user_agent("swal/0.2").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for ticker: {} URL: {}", e, ticker, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for ticker: {}",
                response.status(),
                ticker
            ));
        }

        let text = response.text().await?;
        let data: DailySeriesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", ticker, e))?;

        let series = data
            .series
            .ok_or_else(|| anyhow!("No daily series found for ticker: {}", ticker))?;

        // ISO dates sort lexicographically, so the last key is the most
        // recent trading day.
        let (day, bar) = series
            .iter()
            .next_back()
            .ok_or_else(|| anyhow!("Empty daily series for ticker: {}", ticker))?;

        let price = Decimal::from_str(&bar.close)
            .map_err(|e| anyhow!("Unparsable close '{}' for {}: {}", bar.close, ticker, e))?;
        if price <= Decimal::ZERO {
            return Err(anyhow!(
                "Non-positive close {} for ticker: {}",
                price,
                ticker
            ));
        }

        debug!(%day, %price, "Resolved latest close");
        Ok(Quote {
            ticker: ticker.to_string(),
            price,
        })
    }
}
