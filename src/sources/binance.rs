use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::types::{Candle, Interval};

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// One kline entry as Binance returns it: a positional array mixing numbers
/// and decimal strings.
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,    // open time (ms)
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    i64,    // close time (ms)
    String, // quote asset volume
    i64,    // number of trades
    String, // taker buy base volume
    String, // taker buy quote volume
    String, // unused
);

impl RawKline {
    fn into_candle(self) -> Result<Candle> {
        let parse = |field: &str, value: &str| -> Result<f64> {
            value.parse::<f64>().map_err(|_| {
                AppError::ExchangeApi(format!("invalid {} in kline payload: {:?}", field, value))
            })
        };

        Ok(Candle {
            open_time: self.0,
            open: parse("open", &self.1)?,
            high: parse("high", &self.2)?,
            low: parse("low", &self.3)?,
            close: parse("close", &self.4)?,
            volume: parse("volume", &self.5)?,
        })
    }
}

/// Binance REST client for kline (candlestick) data.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
}

impl BinanceClient {
    /// Create a new Binance client.
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("Vigil/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Fetch up to `limit` klines for a symbol at the given interval,
    /// oldest first. The final candle is still forming.
    pub async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!("{}/klines", BINANCE_API_URL);
        let limit_param = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("limit", limit_param.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Binance API returned {}: {}",
                status,
                &text[..text.len().min(200)]
            );
            return Err(AppError::ExchangeApi(format!(
                "Binance API error: {}",
                status
            )));
        }

        let raw: Vec<RawKline> = response.json().await?;
        let mut candles = Vec::with_capacity(raw.len());
        for kline in raw {
            candles.push(kline.into_candle()?);
        }

        debug!(
            "fetched {} {} candles for {}",
            candles.len(),
            interval,
            symbol
        );
        Ok(candles)
    }
}

impl Default for BinanceClient {
    fn default() -> Self {
        Self::new()
    }
}
