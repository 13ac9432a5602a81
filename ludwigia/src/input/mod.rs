//! Inputs sit between sources and the rest of the system: they stitch the raw rows coming out
//! of the vendor sources into per-ticker series with a guaranteed shape so that nothing
//! downstream ever sees vendor data directly.

pub mod thalia;

use crate::source::{DataSource, RetrievalError};

use thalia::{SeriesBuilder, TickerSeries};

/// Merges one ticker's rows from the historical source and the live source into a single
/// ordered, duplicate-free series.
#[derive(Clone, Debug)]
pub struct Stitcher {
    pub historical: DataSource,
    pub live: DataSource,
}

impl Stitcher {
    pub fn new(historical: DataSource, live: DataSource) -> Self {
        Self { historical, live }
    }

    /// Pull from both sources and stitch.
    ///
    /// Historical rows are inserted first so that when the live back-fill duplicates an
    /// already-closed bar the historical close wins the tie. Either fetch failing abandons the
    /// whole pull.
    pub async fn pull(&self, ticker: &str) -> Result<TickerSeries, RetrievalError> {
        let historical = self.historical.pull(ticker).await?;
        let live = self.live.pull(ticker).await?;

        let mut builder = SeriesBuilder::new(ticker);
        for point in historical.into_iter().chain(live) {
            builder.add_point(point);
        }
        Ok(builder.build())
    }
}
