use std::path::PathBuf;
use std::sync::Mutex;

use derive_more::{Display, Error};
use log::info;
use serde::{Deserialize, Serialize};

use crate::clock::{DateTime, Interval};
use crate::input::thalia::{Thalia, TickerSeries};
use crate::input::Stitcher;
use crate::report::{self, SnapshotError};
use crate::signal;
use crate::source::alphavantage::AlphaVantage;
use crate::source::finnhub::Finnhub;
use crate::source::{DataSource, RetrievalError};

/// Fixed transport frame limit in bytes. A response serializing past this is discarded and
/// replaced, checked after serialization rather than estimated beforehand.
pub const PACKET_SIZE: usize = 4096;

const UNDEFINED_INSTRUCTION: &str = "Undefined Instruction";
const PAYLOAD_TOO_LARGE: &str = "Response payload too large.";

/// Request envelope. The instruction arrives stringly so an unrecognized kind can still be
/// answered instead of failing deserialization.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Query {
    pub instruction: String,
    pub argument: Option<String>,
}

impl Query {
    pub fn new(instruction: impl Into<String>, argument: Option<String>) -> Self {
        Self {
            instruction: instruction.into(),
            argument,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Instruction {
    Data,
    Add,
    Delete,
    Report,
    Unknown,
}

impl Instruction {
    fn parse(raw: &str) -> Self {
        match raw {
            "data" => Instruction::Data,
            "add" => Instruction::Add,
            "delete" => Instruction::Delete,
            "report" => Instruction::Report,
            _ => Instruction::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

/// The column-per-list table returned for a data query, one row per tracked ticker.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct SampleTable {
    pub ticker: Vec<String>,
    pub price: Vec<f64>,
    pub signal: Vec<i64>,
}

/// Instruction-dependent response payload, validated at construction rather than looked up
/// stringly on the receiving side. Serialized untagged so the wire shape stays a plain table,
/// a plain string, or null.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Payload {
    Table(SampleTable),
    Message(String),
    Empty,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Response {
    pub instruction: Instruction,
    pub result: Outcome,
    pub payload: Payload,
}

impl Response {
    pub fn success(instruction: Instruction, payload: Payload) -> Self {
        Self {
            instruction,
            result: Outcome::Success,
            payload,
        }
    }

    pub fn error(instruction: Instruction, message: impl Into<String>) -> Self {
        Self {
            instruction,
            result: Outcome::Error,
            payload: Payload::Message(message.into()),
        }
    }
}

#[derive(Debug, Display, Error)]
pub enum SkyeError {
    #[display("Unable to add ticker {ticker}")]
    DuplicateTicker { ticker: String },
    #[display("Unable to delete ticker {ticker}")]
    UnknownTicker { ticker: String },
    #[display("Unable to parse datetime {raw}")]
    BadTimestamp { raw: String },
    #[display("Missing instruction argument")]
    MissingArgument,
    #[display("Unable to query data")]
    NoData,
    #[display("{_0}")]
    Retrieval(RetrievalError),
    #[display("Unable to write report snapshot")]
    Snapshot { source: SnapshotError },
}

/// Per-vendor credentials for one source.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ApiConfig {
    pub key: String,
    pub url: String,
}

/// Everything the service needs, parsed and validated before it gets here. Immutable once
/// constructed.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub tickers: Vec<String>,
    pub interval: Interval,
    pub alphavantage: ApiConfig,
    pub finnhub: ApiConfig,
}

/// The skye protocol service: one shared [Thalia] store behind a mutex, the stitcher feeding
/// it, and the dispatch of the four instructions against it.
///
/// Requests are handled atomically with respect to each other. Vendor fetches, the only slow
/// operations, always run with the lock released; the lock is only held to read or swap state.
#[derive(Debug)]
pub struct Skye {
    pub state: Mutex<Thalia>,
    pub stitcher: Stitcher,
    pub interval: Interval,
    pub snapshot: PathBuf,
}

impl Skye {
    pub fn new(stitcher: Stitcher, interval: Interval, snapshot: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(Thalia::new()),
            stitcher,
            interval,
            snapshot: snapshot.into(),
        }
    }

    pub fn from_config(config: &ServerConfig, snapshot: impl Into<PathBuf>) -> Self {
        let stitcher = Stitcher::new(
            DataSource::AlphaVantage(AlphaVantage::new(
                config.alphavantage.key.clone(),
                config.alphavantage.url.clone(),
                config.interval,
            )),
            DataSource::Finnhub(Finnhub::new(
                config.finnhub.key.clone(),
                config.finnhub.url.clone(),
                config.interval,
            )),
        );
        Self::new(stitcher, config.interval, snapshot)
    }

    /// Pull and compute every configured ticker, then write the first snapshot. Any failure
    /// aborts startup rather than serving a partial ticker set.
    pub async fn init(&self, tickers: &[String]) -> Result<(), SkyeError> {
        for ticker in tickers {
            let series = self.pull_computed(ticker).await?;
            info!("SKYE: loaded {} samples for {}", series.len(), ticker);
            self.state.lock().unwrap().insert(series);
        }
        let state = self.state.lock().unwrap();
        report::write_snapshot(&self.snapshot, &state)
            .map_err(|source| SkyeError::Snapshot { source })?;
        Ok(())
    }

    /// The whole service boundary: raw request bytes in, raw response bytes out. Never fails;
    /// every error becomes an error response.
    pub async fn process(&self, raw: &[u8]) -> Vec<u8> {
        let response = match serde_json::from_slice::<Query>(raw) {
            Ok(query) => self.dispatch(query).await,
            Err(_) => Response::error(Instruction::Unknown, UNDEFINED_INSTRUCTION),
        };
        seal(response)
    }

    async fn dispatch(&self, query: Query) -> Response {
        let argument = query.argument.as_deref();
        match Instruction::parse(&query.instruction) {
            Instruction::Data => match self.data(argument) {
                Ok(table) => Response::success(Instruction::Data, Payload::Table(table)),
                Err(err) => Response::error(Instruction::Data, err.to_string()),
            },
            Instruction::Add => match self.add(argument).await {
                Ok(message) => Response::success(Instruction::Add, Payload::Message(message)),
                Err(err) => Response::error(Instruction::Add, err.to_string()),
            },
            Instruction::Delete => match self.delete(argument) {
                Ok(message) => Response::success(Instruction::Delete, Payload::Message(message)),
                Err(err) => Response::error(Instruction::Delete, err.to_string()),
            },
            Instruction::Report => match self.report().await {
                Ok(()) => Response::success(Instruction::Report, Payload::Empty),
                Err(err) => Response::error(Instruction::Report, err.to_string()),
            },
            Instruction::Unknown => Response::error(Instruction::Unknown, UNDEFINED_INSTRUCTION),
        }
    }

    fn data(&self, argument: Option<&str>) -> Result<SampleTable, SkyeError> {
        let raw = argument.ok_or(SkyeError::MissingArgument)?;
        let date = DateTime::from_query_string(raw).map_err(|_| SkyeError::BadTimestamp {
            raw: raw.to_string(),
        })?;

        let state = self.state.lock().unwrap();
        let samples = state.sample_all(*date).ok_or(SkyeError::NoData)?;

        let mut table = SampleTable::default();
        for sample in samples {
            table.ticker.push(sample.ticker);
            table.price.push(sample.price);
            table.signal.push(sample.signal);
        }
        Ok(table)
    }

    async fn add(&self, argument: Option<&str>) -> Result<String, SkyeError> {
        let ticker = argument.ok_or(SkyeError::MissingArgument)?.to_string();
        if self.state.lock().unwrap().contains(&ticker) {
            return Err(SkyeError::DuplicateTicker { ticker });
        }

        //Fetch before touching state so a failed add leaves it bit-identical
        let series = self.pull_computed(&ticker).await?;

        let mut state = self.state.lock().unwrap();
        if state.contains(&ticker) {
            return Err(SkyeError::DuplicateTicker { ticker });
        }
        info!("SKYE: added {} with {} samples", ticker, series.len());
        state.insert(series);
        Ok(format!("Successfully added ticker {ticker}"))
    }

    fn delete(&self, argument: Option<&str>) -> Result<String, SkyeError> {
        let ticker = argument.ok_or(SkyeError::MissingArgument)?;
        let mut state = self.state.lock().unwrap();
        state.remove(ticker).ok_or_else(|| SkyeError::UnknownTicker {
            ticker: ticker.to_string(),
        })?;
        info!("SKYE: deleted {}", ticker);
        Ok(format!("Successfully deleted ticker {ticker}"))
    }

    /// Full refresh: re-pull and recompute every tracked ticker into a staging set, swap the
    /// staging set in, then persist the snapshot. A failed pull reports one error and leaves
    /// the live state untouched.
    async fn report(&self) -> Result<(), SkyeError> {
        let tickers = self.state.lock().unwrap().tickers().to_vec();

        let mut refreshed = Vec::with_capacity(tickers.len());
        for ticker in &tickers {
            refreshed.push(self.pull_computed(ticker).await?);
        }

        let mut state = self.state.lock().unwrap();
        for series in refreshed {
            state.insert(series);
        }
        report::write_snapshot(&self.snapshot, &state)
            .map_err(|source| SkyeError::Snapshot { source })?;
        info!("SKYE: refreshed {} tickers", tickers.len());
        Ok(())
    }

    async fn pull_computed(&self, ticker: &str) -> Result<TickerSeries, SkyeError> {
        let mut series = self
            .stitcher
            .pull(ticker)
            .await
            .map_err(SkyeError::Retrieval)?;
        signal::compute(&mut series, self.interval.window());
        Ok(series)
    }
}

/// Serialize a response, substituting the oversize fallback when the blob would not fit one
/// transport frame. The fallback keeps the original instruction tag.
fn seal(response: Response) -> Vec<u8> {
    let bytes = match serde_json::to_vec(&response) {
        Ok(bytes) => bytes,
        Err(_) => return fallback_bytes(),
    };
    if bytes.len() > PACKET_SIZE {
        let substitute = Response::error(response.instruction, PAYLOAD_TOO_LARGE);
        return serde_json::to_vec(&substitute).unwrap_or_else(|_| fallback_bytes());
    }
    bytes
}

fn fallback_bytes() -> Vec<u8> {
    br#"{"instruction":"unknown","result":"error","payload":"Undefined Instruction"}"#.to_vec()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use crate::clock::Interval;
    use crate::input::thalia::TickerSeries;
    use crate::input::Stitcher;
    use crate::signal;
    use crate::source::{replay::Replay, DataSource};

    use super::{Instruction, Outcome, Payload, Query, Response, Skye, PACKET_SIZE};

    fn fixtures() -> &'static Path {
        Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"))
    }

    fn replay_skye(snapshot: &str) -> Skye {
        let stitcher = Stitcher::new(
            DataSource::Replay(Replay::new(fixtures(), "av")),
            DataSource::Replay(Replay::new(fixtures(), "fh")),
        );
        let mut path = PathBuf::from(std::env::temp_dir());
        path.push(snapshot);
        Skye::new(stitcher, Interval::ThirtyMin, path)
    }

    async fn send(skye: &Skye, instruction: &str, argument: Option<&str>) -> Response {
        let query = Query::new(instruction, argument.map(|arg| arg.to_string()));
        let raw = serde_json::to_vec(&query).unwrap();
        serde_json::from_slice(&skye.process(&raw).await).unwrap()
    }

    #[tokio::test]
    async fn test_that_data_query_resolves_the_nearest_row() {
        let skye = replay_skye("skye_data.csv");
        skye.init(&["ACME".to_string()]).await.unwrap();

        let response = send(&skye, "data", Some("2021-06-01-10:20")).await;
        assert_eq!(response.result, Outcome::Success);
        match response.payload {
            Payload::Table(table) => {
                assert_eq!(table.ticker, vec!["ACME".to_string()]);
                //10:20 sits between 10:00 and 10:30 and must round to the 10:30 close
                assert_eq!(table.price, vec![102.0]);
            }
            other => panic!("expected table payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_that_historical_close_wins_the_stitch_tie() {
        let skye = replay_skye("skye_stitch.csv");
        skye.init(&["ACME".to_string()]).await.unwrap();

        //The live fixture carries 102.5 for the same 10:30 bar the historical closes at 102.0
        let response = send(&skye, "data", Some("2021-06-01-10:30")).await;
        match response.payload {
            Payload::Table(table) => assert_eq!(table.price, vec![102.0]),
            other => panic!("expected table payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_that_bad_timestamp_is_reported_not_fatal() {
        let skye = replay_skye("skye_badts.csv");
        skye.init(&["ACME".to_string()]).await.unwrap();

        let response = send(&skye, "data", Some("junk")).await;
        assert_eq!(response.result, Outcome::Error);
        assert_eq!(response.instruction, Instruction::Data);
    }

    #[tokio::test]
    async fn test_that_delete_of_untracked_ticker_errors() {
        let skye = replay_skye("skye_delete.csv");
        let response = send(&skye, "delete", Some("ZZZ")).await;

        assert_eq!(response.result, Outcome::Error);
        assert_eq!(
            response.payload,
            Payload::Message("Unable to delete ticker ZZZ".to_string())
        );
    }

    #[tokio::test]
    async fn test_that_add_then_delete_round_trips_state() {
        let skye = replay_skye("skye_roundtrip.csv");
        skye.init(&["ACME".to_string()]).await.unwrap();
        let before = skye.state.lock().unwrap().tickers().to_vec();

        let added = send(&skye, "add", Some("NEWT")).await;
        assert_eq!(added.result, Outcome::Success);
        assert_eq!(skye.state.lock().unwrap().len(), 2);

        let deleted = send(&skye, "delete", Some("NEWT")).await;
        assert_eq!(deleted.result, Outcome::Success);

        let after = skye.state.lock().unwrap().tickers().to_vec();
        assert_eq!(before, after);
        assert!(!skye.state.lock().unwrap().contains("NEWT"));
    }

    #[tokio::test]
    async fn test_that_duplicate_add_is_rejected() {
        let skye = replay_skye("skye_dup.csv");
        skye.init(&["ACME".to_string()]).await.unwrap();

        let response = send(&skye, "add", Some("ACME")).await;
        assert_eq!(response.result, Outcome::Error);
        assert_eq!(
            response.payload,
            Payload::Message("Unable to add ticker ACME".to_string())
        );
    }

    #[tokio::test]
    async fn test_that_failed_add_leaves_state_untouched() {
        let skye = replay_skye("skye_failed_add.csv");
        skye.init(&["ACME".to_string()]).await.unwrap();

        //No fixture exists for GONE so the pull fails after validation passed
        let response = send(&skye, "add", Some("GONE")).await;
        assert_eq!(response.result, Outcome::Error);
        assert_eq!(
            skye.state.lock().unwrap().tickers(),
            &["ACME".to_string()]
        );
    }

    #[tokio::test]
    async fn test_that_undefined_instruction_is_reported() {
        let skye = replay_skye("skye_undefined.csv");
        let response = send(&skye, "bogus", None).await;

        assert_eq!(response.instruction, Instruction::Unknown);
        assert_eq!(response.result, Outcome::Error);
        assert_eq!(
            response.payload,
            Payload::Message("Undefined Instruction".to_string())
        );
    }

    #[tokio::test]
    async fn test_that_garbage_bytes_get_one_error_response() {
        let skye = replay_skye("skye_garbage.csv");
        let raw = skye.process(b"not json at all").await;
        let response: Response = serde_json::from_slice(&raw).unwrap();
        assert_eq!(response.result, Outcome::Error);
    }

    #[tokio::test]
    async fn test_that_oversized_response_is_substituted() {
        let skye = replay_skye("skye_oversize.csv");
        {
            let mut state = skye.state.lock().unwrap();
            for idx in 0..200 {
                let mut series = TickerSeries::random(format!("TICK{idx}"), 8);
                signal::compute(&mut series, 4);
                state.insert(series);
            }
        }

        let raw = serde_json::to_vec(&Query::new("data", Some("2021-06-01-10:00".to_string())))
            .unwrap();
        let blob = skye.process(&raw).await;
        assert!(blob.len() <= PACKET_SIZE);

        let response: Response = serde_json::from_slice(&blob).unwrap();
        assert_eq!(response.instruction, Instruction::Data);
        assert_eq!(response.result, Outcome::Error);
        assert_eq!(
            response.payload,
            Payload::Message("Response payload too large.".to_string())
        );
    }

    #[tokio::test]
    async fn test_that_report_refreshes_and_writes_the_snapshot() {
        let skye = replay_skye("skye_report.csv");
        skye.init(&["ACME".to_string()]).await.unwrap();

        let response = send(&skye, "report", None).await;
        assert_eq!(response.result, Outcome::Success);
        assert_eq!(response.payload, Payload::Empty);

        let mut reader = csv::Reader::from_path(&skye.snapshot).unwrap();
        assert!(reader.records().count() > 0);
    }

    #[tokio::test]
    async fn test_that_data_query_with_nothing_tracked_errors() {
        let skye = replay_skye("skye_empty.csv");
        let response = send(&skye, "data", Some("2021-06-01-10:00")).await;
        assert_eq!(response.result, Outcome::Error);
    }
}
