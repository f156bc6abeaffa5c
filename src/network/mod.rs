//! HTTP probing of registry endpoints: latency measurement, URL
//! validation, and the sequential speed-test batch runner.

pub mod probe;
pub mod speedtest;
