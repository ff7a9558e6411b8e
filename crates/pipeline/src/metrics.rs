//! Run metrics

use std::time::{Duration, Instant};

/// Timings and counts collected during one pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineMetrics {
    /// Loading and parsing, or the cache lookup on a hit
    pub parse_time: Duration,
    /// Normalization; zero on a cache hit
    pub convert_time: Duration,
    pub generate_time: Duration,
    pub total_time: Duration,
    /// Operations in the normalized document
    pub endpoints_count: usize,
    pub generated_count: usize,
    pub incomplete_endpoints: usize,
    pub cache_hit: bool,
}

/// Measure the wall-clock time of `f`
pub(crate) fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}
