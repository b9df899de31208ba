//! repopulse
//!
//! Fetches repository activity metrics (pull request counts, contributor
//! counts and their time evolution) from source-control hosting providers,
//! caches the results with a time-based expiry, and renders them for
//! comparison.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod display;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod storage;
pub mod timeseries;
