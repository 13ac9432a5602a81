//! Client-side half of the skye protocol: a thin reqwest wrapper plus the line parsing and
//! validation the REPL does before anything touches the network.

pub mod client;
