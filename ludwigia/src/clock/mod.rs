//! Datetime plumbing shared across sources, queries and the snapshot writer.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Minutes in a regular 09:30 to 16:00 trading session.
pub const SESSION_MINUTES: f64 = 390.0;

/// Sampling granularity of the price series.
///
/// Serialized in the vendor query-string form (`"30min"`) so the same value can be written
/// into request URLs and read back from the configuration document.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum Interval {
    #[serde(rename = "5min")]
    FiveMin,
    #[serde(rename = "10min")]
    TenMin,
    #[serde(rename = "15min")]
    FifteenMin,
    #[serde(rename = "30min")]
    ThirtyMin,
    #[serde(rename = "60min")]
    SixtyMin,
}

impl Interval {
    pub fn minutes(&self) -> i64 {
        match self {
            Interval::FiveMin => 5,
            Interval::TenMin => 10,
            Interval::FifteenMin => 15,
            Interval::ThirtyMin => 30,
            Interval::SixtyMin => 60,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.minutes() * 60
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interval::FiveMin => "5min",
            Interval::TenMin => "10min",
            Interval::FifteenMin => "15min",
            Interval::ThirtyMin => "30min",
            Interval::SixtyMin => "60min",
        }
    }

    /// Number of samples in the trailing one-session lookback used for rolling statistics.
    pub fn window(&self) -> usize {
        (SESSION_MINUTES / self.minutes() as f64).round() as usize
    }
}

///[DateTime] is a wrapper around the epoch time as i64. The internal representation with the
///time package stays hidden from clients so the dependency can be swapped without touching
///the call sites.
#[derive(Clone, Debug, Hash, Eq, PartialEq, PartialOrd, Copy, Ord)]
pub struct DateTime(i64);

impl DateTime {
    /// Parse the client query form, e.g. `2021-06-01-10:00`.
    pub fn from_query_string(val: &str) -> Result<Self, time::error::Parse> {
        let format = format_description!("[year]-[month]-[day]-[hour]:[minute]");
        let parsed = PrimitiveDateTime::parse(val, format)?;
        Ok(Self(parsed.assume_utc().unix_timestamp()))
    }

    /// Parse the vendor bar form, e.g. `2021-06-01 10:00:00`.
    pub fn from_bar_string(val: &str) -> Result<Self, time::error::Parse> {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let parsed = PrimitiveDateTime::parse(val, format)?;
        Ok(Self(parsed.assume_utc().unix_timestamp()))
    }

    /// The 09:30 session open on the same day as this timestamp.
    pub fn session_open(&self) -> Self {
        let date: OffsetDateTime = (*self).into();
        let open = date.date().with_time(time::macros::time!(09:30));
        Self(open.assume_utc().unix_timestamp())
    }

    /// Render back into the vendor bar form for tabular output.
    pub fn to_stamp(&self) -> Result<String, time::error::Format> {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let date: OffsetDateTime = (*self).into();
        date.format(format)
    }
}

impl Deref for DateTime {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime> for OffsetDateTime {
    fn from(v: DateTime) -> Self {
        if let Ok(date) = OffsetDateTime::from_unix_timestamp(i64::from(v)) {
            date
        } else {
            panic!("Tried to convert non-date value");
        }
    }
}

impl From<DateTime> for i64 {
    fn from(v: DateTime) -> Self {
        v.0
    }
}

impl From<i64> for DateTime {
    fn from(v: i64) -> Self {
        DateTime(v)
    }
}
