use std::collections::{HashMap, HashSet};

use rand::thread_rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// One normalized price observation. Immutable once produced by a source.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct PricePoint {
    pub date: i64,
    pub price: f64,
}

/// One row handed back to a point-in-time query.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Sample {
    pub ticker: String,
    pub date: i64,
    pub price: f64,
    pub signal: i64,
}

/// Columnar per-ticker series: the price column plus the derived analytics columns, all
/// aligned on the same strictly increasing date index.
///
/// The derived columns are empty until `signal::compute` runs and must be recomputed from
/// scratch whenever the price column changes.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TickerSeries {
    pub symbol: String,
    pub dates: Vec<i64>,
    pub price: Vec<f64>,
    pub rolling_avg: Vec<f64>,
    pub rolling_std: Vec<f64>,
    pub signal: Vec<i64>,
    pub position: Vec<i64>,
    pub unit_return: Vec<f64>,
    pub pnl: Vec<f64>,
}

impl TickerSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            dates: Vec::new(),
            price: Vec::new(),
            rolling_avg: Vec::new(),
            rolling_std: Vec::new(),
            signal: Vec::new(),
            position: Vec::new(),
            unit_return: Vec::new(),
            pnl: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Index of the row whose date is nearest to `date` by absolute distance; ties go to the
    /// earlier row. A date far outside the available range still resolves to the boundary row.
    fn nearest_idx(&self, date: i64) -> Option<usize> {
        let mut best: Option<(usize, i64)> = None;
        for (idx, row_date) in self.dates.iter().enumerate() {
            let distance = (row_date - date).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((idx, distance)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// The ticker/price/signal row nearest to `date`. None only when the series is empty or
    /// the derived columns have not been computed.
    pub fn nearest(&self, date: i64) -> Option<Sample> {
        let idx = self.nearest_idx(date)?;
        Some(Sample {
            ticker: self.symbol.clone(),
            date: *self.dates.get(idx)?,
            price: *self.price.get(idx)?,
            signal: *self.signal.get(idx)?,
        })
    }

    /// Random walk series with computed-length but uncomputed analytics columns, for tests and
    /// benches.
    pub fn random(symbol: impl Into<String>, length: usize) -> Self {
        let price_dist = Uniform::new(90.0, 100.0);
        let mut rng = thread_rng();

        let mut builder = SeriesBuilder::new(symbol);
        for slot in 0..length {
            builder.add_point(PricePoint {
                date: 100 + (slot as i64) * 60,
                price: price_dist.sample(&mut rng),
            });
        }
        builder.build()
    }
}

/// Accumulates stitched rows, dropping later arrivals for an already-seen date, and produces a
/// [TickerSeries] sorted ascending.
pub struct SeriesBuilder {
    symbol: String,
    points: Vec<PricePoint>,
    seen: HashSet<i64>,
}

impl SeriesBuilder {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            points: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// First write for a date wins; duplicates are dropped.
    pub fn add_point(&mut self, point: PricePoint) {
        if self.seen.insert(point.date) {
            self.points.push(point);
        }
    }

    pub fn build(mut self) -> TickerSeries {
        self.points.sort_by_key(|point| point.date);

        let mut series = TickerSeries::new(self.symbol);
        for point in self.points {
            series.dates.push(point.date);
            series.price.push(point.price);
        }
        series
    }
}

/// The server-side data store: the ordered set of tracked tickers and one series per ticker.
///
/// Plain container with no locking of its own; the service layer is the sole mutator and
/// serializes access.
#[derive(Debug, Default)]
pub struct Thalia {
    tickers: Vec<String>,
    inner: HashMap<String, TickerSeries>,
}

impl Thalia {
    pub fn new() -> Self {
        Self {
            tickers: Vec::new(),
            inner: HashMap::new(),
        }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.inner.contains_key(ticker)
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerSeries> {
        self.inner.get(ticker)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Insert or replace the series for its symbol, tracking the symbol on first insert.
    pub fn insert(&mut self, series: TickerSeries) {
        if !self.inner.contains_key(&series.symbol) {
            self.tickers.push(series.symbol.clone());
        }
        self.inner.insert(series.symbol.clone(), series);
    }

    pub fn remove(&mut self, ticker: &str) -> Option<TickerSeries> {
        let series = self.inner.remove(ticker)?;
        self.tickers.retain(|tracked| tracked != ticker);
        Some(series)
    }

    /// One nearest-row sample per tracked ticker, in tracked order. None when nothing is
    /// tracked or any single ticker cannot resolve, so callers never see a partial result.
    pub fn sample_all(&self, date: i64) -> Option<Vec<Sample>> {
        if self.tickers.is_empty() {
            return None;
        }
        let mut samples = Vec::with_capacity(self.tickers.len());
        for ticker in &self.tickers {
            samples.push(self.get(ticker)?.nearest(date)?);
        }
        Some(samples)
    }

    /// Tracked series in tracked order.
    pub fn iter(&self) -> impl Iterator<Item = &TickerSeries> {
        self.tickers
            .iter()
            .filter_map(|ticker| self.inner.get(ticker))
    }
}
