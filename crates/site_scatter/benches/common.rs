use std::time::Duration;

use criterion::{Criterion, Throughput};

pub const SAMPLE_SIZE: usize = 10;
pub const WARM_UP: Duration = Duration::from_millis(500);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

/// Shorter sampling than criterion's defaults; geometry-heavy iterations are slow.
pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

/// Throughput in accepted points or constraints; never zero so reports stay readable.
pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Seed derived from a benchmark parameter so each case draws its own stream.
#[allow(dead_code)]
pub fn seed_for(base: u64, parameter: f64) -> u64 {
    base ^ parameter.to_bits().rotate_left(17)
}
