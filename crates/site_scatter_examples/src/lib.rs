#![forbid(unsafe_code)]

mod reporting;

pub use reporting::{init_tracing, log_event, report_outcome, report_records};
