//! Writes the flat snapshot of every tracked series to disk. The file is a plain overwrite,
//! one row per sample; a crash mid-write leaves a torn file that the next write replaces.

use std::path::Path;

use derive_more::{Display, Error};
use serde::Serialize;

use crate::clock::DateTime;
use crate::input::thalia::Thalia;

#[derive(Debug, Display, Error)]
pub enum SnapshotError {
    #[display("unable to write snapshot")]
    Write { source: csv::Error },
    #[display("unable to format a snapshot datetime")]
    Stamp { source: time::error::Format },
}

#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    ticker: &'a str,
    datetime: String,
    price: f64,
    rolling_avg: Option<f64>,
    rolling_std: Option<f64>,
    signal: i64,
    position: i64,
    unit_return: Option<f64>,
    pnl: f64,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Dump every tracked ticker's full series, in tracked order, overwriting `path`.
pub fn write_snapshot(path: &Path, data: &Thalia) -> Result<(), SnapshotError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|source| SnapshotError::Write { source })?;

    for series in data.iter() {
        for idx in 0..series.len() {
            let datetime = DateTime::from(series.dates[idx])
                .to_stamp()
                .map_err(|source| SnapshotError::Stamp { source })?;
            let row = SnapshotRow {
                ticker: &series.symbol,
                datetime,
                price: series.price[idx],
                rolling_avg: finite(series.rolling_avg[idx]),
                rolling_std: finite(series.rolling_std[idx]),
                signal: series.signal[idx],
                position: series.position[idx],
                unit_return: finite(series.unit_return[idx]),
                pnl: series.pnl[idx],
            };
            writer
                .serialize(row)
                .map_err(|source| SnapshotError::Write { source })?;
        }
    }
    writer
        .flush()
        .map_err(|source| SnapshotError::Write {
            source: csv::Error::from(source),
        })
}
