//! Timeseries reconstruction
//!
//! Converts raw, unordered repository events into fixed-cadence cumulative
//! count series over a bounded historical window, and normalizes sampled
//! mappings into the stored datapoint sequences.

pub mod normalize;
pub mod sampler;

pub use normalize::fill_timeseries;
pub use sampler::{
    closed_pull_request_series, contributor_series, open_pull_request_series, CommitEvent,
    PullRequestEvent, SamplingWindow, DEFAULT_LOOKBACK_DAYS, MAX_COMMITS_SAMPLED,
    SAMPLE_INTERVAL_DAYS,
};
