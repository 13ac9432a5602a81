//! Ludwigia maintains a rolling intraday price series per tracked ticker, derives a momentum
//! signal with an implied position and running PnL from it, and answers point-in-time queries
//! and mutation requests through a small JSON message protocol.
//!
//! The library is transport-agnostic: `service::skye_v1` turns raw request bytes into raw
//! response bytes and the binding to an actual listener lives in `ludwigia-http`.

pub mod clock;
pub mod input;
pub mod report;
pub mod service;
pub mod signal;
pub mod source;
