//! Derives the analytics columns of a [TickerSeries]: rolling band, momentum signal, implied
//! position and running PnL. Every run recomputes from scratch; there is no incremental path,
//! so the result depends only on the price column and the window.

use itertools::Itertools;

use crate::input::thalia::TickerSeries;

/// Simple moving mean over the trailing `window` samples ending at each index, inclusive.
/// NaN for the first `window - 1` indexes where the lookback is not yet full.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }
    for end in (window - 1)..values.len() {
        let lookback = &values[end + 1 - window..=end];
        out[end] = lookback.iter().sum::<f64>() / window as f64;
    }
    out
}

/// Sample standard deviation (n - 1 denominator) over the same trailing window as
/// [rolling_mean]. NaN while the lookback is not full, and for a window of one where the
/// denominator degenerates.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }
    for end in (window - 1)..values.len() {
        let lookback = &values[end + 1 - window..=end];
        let mean = lookback.iter().sum::<f64>() / window as f64;
        let squared: f64 = lookback.iter().map(|value| (value - mean).powi(2)).sum();
        out[end] = (squared / (window as f64 - 1.0)).sqrt();
    }
    out
}

/// Recompute every derived column, in dependency order.
///
/// * signal: +1 above the `avg + std` band, -1 below `avg - std`, else 0. A NaN band fails
///   both comparisons, so the warm-up rows come out 0.
/// * position: cumulative signal shifted forward one sample; acting on yesterday's signal
///   today, with no long/short cap.
/// * unit_return: first difference of price, undefined at index 0.
/// * pnl: `position[t-1] * unit_return[t]`, pinned to 0 at index 0.
pub fn compute(series: &mut TickerSeries, window: usize) {
    let n = series.price.len();

    series.rolling_avg = rolling_mean(&series.price, window);
    series.rolling_std = rolling_std(&series.price, window);

    series.signal = series
        .price
        .iter()
        .zip(series.rolling_avg.iter().zip(series.rolling_std.iter()))
        .map(|(price, (avg, std))| {
            if *price > avg + std {
                1
            } else if *price < avg - std {
                -1
            } else {
                0
            }
        })
        .collect_vec();

    let mut position = Vec::with_capacity(n);
    let mut running = 0i64;
    for idx in 0..n {
        if idx > 0 {
            running += series.signal[idx - 1];
        }
        position.push(running);
    }
    series.position = position;

    let mut unit_return = vec![f64::NAN; n];
    for idx in 1..n {
        unit_return[idx] = series.price[idx] - series.price[idx - 1];
    }
    series.unit_return = unit_return;

    let mut pnl = Vec::with_capacity(n);
    for idx in 0..n {
        if idx == 0 {
            pnl.push(0.0);
        } else {
            pnl.push(series.position[idx - 1] as f64 * series.unit_return[idx]);
        }
    }
    series.pnl = pnl;
}
