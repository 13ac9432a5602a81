use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clock::{DateTime, Interval};
use crate::input::thalia::PricePoint;

use super::RetrievalError;

const VENDOR: &str = "alphavantage";

/// One intraday bar as Alpha Vantage ships it: every field arrives as a string.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IntradayBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

/// Trailing intraday history source. One fetch returns roughly a month of fixed-interval bars
/// for regular trading hours, keyed by a `YYYY-MM-DD HH:MM:SS` stamp.
#[derive(Clone, Debug)]
pub struct AlphaVantage {
    key: String,
    url: String,
    interval: Interval,
    client: reqwest::Client,
}

impl AlphaVantage {
    pub fn new(key: impl Into<String>, url: impl Into<String>, interval: Interval) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            interval,
            client: reqwest::Client::new(),
        }
    }

    fn build_url(&self, ticker: &str) -> String {
        format!(
            "{}function=TIME_SERIES_INTRADAY&interval={}&outputsize=full&extended_hours=false&apikey={}&symbol={}",
            self.url,
            self.interval.label(),
            self.key,
            ticker
        )
    }

    pub async fn fetch_raw(&self, ticker: &str) -> Result<serde_json::Value, RetrievalError> {
        let wrap = |source| RetrievalError::Fetch {
            vendor: VENDOR,
            ticker: ticker.to_string(),
            source,
        };
        self.client
            .get(self.build_url(ticker))
            .send()
            .await
            .map_err(wrap)?
            .json::<serde_json::Value>()
            .await
            .map_err(wrap)
    }

    /// Keep the close of every bar, drop open/high/low/volume.
    pub fn normalize(
        &self,
        raw: serde_json::Value,
        ticker: &str,
    ) -> Result<Vec<PricePoint>, RetrievalError> {
        let key = format!("Time Series ({})", self.interval.label());
        let table = raw.get(&key).cloned().ok_or(RetrievalError::Shape {
            vendor: VENDOR,
            ticker: ticker.to_string(),
        })?;
        let bars: HashMap<String, IntradayBar> =
            serde_json::from_value(table).map_err(|_| RetrievalError::Shape {
                vendor: VENDOR,
                ticker: ticker.to_string(),
            })?;

        let record_err = || RetrievalError::Record {
            vendor: VENDOR,
            ticker: ticker.to_string(),
        };
        let mut points = Vec::with_capacity(bars.len());
        for (stamp, bar) in bars {
            let date = DateTime::from_bar_string(&stamp).map_err(|_| record_err())?;
            let price: f64 = bar.close.parse().map_err(|_| record_err())?;
            points.push(PricePoint {
                date: *date,
                price,
            });
        }
        Ok(points)
    }
}
