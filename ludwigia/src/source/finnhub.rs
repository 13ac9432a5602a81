use serde::{Deserialize, Serialize};

use crate::clock::{DateTime, Interval};
use crate::input::thalia::PricePoint;

use super::RetrievalError;

const VENDOR: &str = "finnhub";

/// The latest-quote record Finnhub returns for one symbol.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuoteRecord {
    /// Current price.
    pub c: f64,
    /// High of the day.
    pub h: f64,
    /// Low of the day.
    pub l: f64,
    /// Open of the day.
    pub o: f64,
    /// Previous close.
    pub pc: f64,
    /// Quote time as epoch seconds.
    pub t: i64,
}

/// Latest-quote source. One fetch returns a single quote, which [Finnhub::normalize] back-fills
/// into a dense series from the session open.
#[derive(Clone, Debug)]
pub struct Finnhub {
    key: String,
    url: String,
    interval: Interval,
    client: reqwest::Client,
}

impl Finnhub {
    pub fn new(key: impl Into<String>, url: impl Into<String>, interval: Interval) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            interval,
            client: reqwest::Client::new(),
        }
    }

    fn build_url(&self, ticker: &str) -> String {
        format!("{}token={}&symbol={}", self.url, self.key, ticker)
    }

    pub async fn fetch_raw(&self, ticker: &str) -> Result<QuoteRecord, RetrievalError> {
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
            .json::<QuoteRecord>()
            .await
            .map_err(wrap)
    }

    /// Synthesize a dense index from the quote day's 09:30 session open up to the quote time
    /// and flat-fill every slot with the one observed price. No interpolation: every slot gets
    /// exactly the latest known price, which is only a stand-in for the missing intraday ticks.
    pub fn normalize(&self, raw: QuoteRecord) -> Result<Vec<PricePoint>, RetrievalError> {
        let quote_time = DateTime::from(raw.t);
        let open = quote_time.session_open();

        let mut points = Vec::new();
        let mut slot = *open;
        while slot <= *quote_time {
            points.push(PricePoint {
                date: slot,
                price: raw.c,
            });
            slot += self.interval.seconds();
        }
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::{DateTime, Interval};

    use super::{Finnhub, QuoteRecord};

    fn quote_at(stamp: &str, price: f64) -> QuoteRecord {
        QuoteRecord {
            c: price,
            h: price,
            l: price,
            o: price,
            pc: price,
            t: *DateTime::from_bar_string(stamp).unwrap(),
        }
    }

    #[test]
    fn test_that_backfill_is_dense_and_flat() {
        let source = Finnhub::new("TOKEN", "https://example.com/quote?", Interval::ThirtyMin);
        let points = source
            .normalize(quote_at("2021-06-01 11:00:00", 102.5))
            .unwrap();

        //09:30, 10:00, 10:30, 11:00
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.price == 102.5));
        assert_eq!(
            points[0].date,
            *DateTime::from_bar_string("2021-06-01 09:30:00").unwrap()
        );
        assert_eq!(
            points[3].date,
            *DateTime::from_bar_string("2021-06-01 11:00:00").unwrap()
        );
        let step = Interval::ThirtyMin.seconds();
        assert!(points.windows(2).all(|w| w[1].date - w[0].date == step));
    }

    #[test]
    fn test_that_premarket_quote_yields_no_rows() {
        let source = Finnhub::new("TOKEN", "https://example.com/quote?", Interval::ThirtyMin);
        let points = source
            .normalize(quote_at("2021-06-01 08:00:00", 99.0))
            .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_that_quote_on_the_open_yields_one_row() {
        let source = Finnhub::new("TOKEN", "https://example.com/quote?", Interval::FiveMin);
        let points = source
            .normalize(quote_at("2021-06-01 09:30:00", 100.0))
            .unwrap();
        assert_eq!(points.len(), 1);
    }
}
