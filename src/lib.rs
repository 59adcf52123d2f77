//! pricewatch — MM2 storefront price monitor.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod engine;
pub mod notify;
pub mod platforms;
pub mod types;
