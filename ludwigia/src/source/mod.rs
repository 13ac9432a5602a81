//! Sources are the external vendors that price data is retrieved from. Each source has its own
//! raw wire format that is normalized into [PricePoint] rows before anything downstream sees
//! it; clients should never have to marshall vendor data themselves.

pub mod alphavantage;
pub mod finnhub;
pub mod replay;

use derive_more::{Display, Error};

use crate::input::thalia::PricePoint;

use alphavantage::AlphaVantage;
use finnhub::Finnhub;
use replay::Replay;

/// Raised when a fetch or normalize step fails; the caller decides whether the whole pull is
/// abandoned.
#[derive(Debug, Display, Error)]
pub enum RetrievalError {
    #[display("request to {vendor} failed for {ticker}")]
    Fetch {
        vendor: &'static str,
        ticker: String,
        source: reqwest::Error,
    },
    #[display("{vendor} response for {ticker} is missing the expected shape")]
    Shape {
        vendor: &'static str,
        ticker: String,
    },
    #[display("could not parse a {vendor} record for {ticker}")]
    Record {
        vendor: &'static str,
        ticker: String,
    },
    #[display("replay fixture for {ticker} is unreadable")]
    Fixture { ticker: String, source: csv::Error },
}

/// A price data source.
///
/// Variants rather than a trait object: there are exactly two vendor behaviors (a trailing
/// intraday history and a single latest quote that has to be back-filled) plus the replay
/// source used to serve fixtures without spending API quota.
#[derive(Clone, Debug)]
pub enum DataSource {
    AlphaVantage(AlphaVantage),
    Finnhub(Finnhub),
    Replay(Replay),
}

impl DataSource {
    /// Fetch and normalize one ticker's rows from this source.
    pub async fn pull(&self, ticker: &str) -> Result<Vec<PricePoint>, RetrievalError> {
        match self {
            DataSource::AlphaVantage(source) => {
                let raw = source.fetch_raw(ticker).await?;
                source.normalize(raw, ticker)
            }
            DataSource::Finnhub(source) => {
                let raw = source.fetch_raw(ticker).await?;
                source.normalize(raw)
            }
            DataSource::Replay(source) => source.read(ticker),
        }
    }
}
