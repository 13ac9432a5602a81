//! Binds the transport-agnostic ludwigia service to an actix-web listener. Each protocol
//! generation gets its own module so clients can keep talking to an old one while a new one
//! is rolled out.

pub mod http;
