use std::path::PathBuf;

use serde::Deserialize;

use crate::clock::DateTime;
use crate::input::thalia::PricePoint;

use super::RetrievalError;

#[derive(Debug, Deserialize)]
struct ReplayRow {
    datetime: String,
    price: f64,
}

/// File-backed source that serves previously captured rows from
/// `<dir>/<prefix>_<ticker>.csv`. Used by tests and offline runs to preserve vendor API quota.
#[derive(Clone, Debug)]
pub struct Replay {
    dir: PathBuf,
    prefix: String,
}

impl Replay {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn read(&self, ticker: &str) -> Result<Vec<PricePoint>, RetrievalError> {
        let path = self.dir.join(format!("{}_{}.csv", self.prefix, ticker));
        let fixture_err = |source| RetrievalError::Fixture {
            ticker: ticker.to_string(),
            source,
        };

        let mut reader = csv::Reader::from_path(&path).map_err(fixture_err)?;
        let mut points = Vec::new();
        for row in reader.deserialize::<ReplayRow>() {
            let row = row.map_err(fixture_err)?;
            let date = DateTime::from_bar_string(&row.datetime).map_err(|_| {
                RetrievalError::Record {
                    vendor: "replay",
                    ticker: ticker.to_string(),
                }
            })?;
            points.push(PricePoint {
                date: *date,
                price: row.price,
            });
        }
        Ok(points)
    }
}
