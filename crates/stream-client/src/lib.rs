pub mod logging;

pub use logging::setup_console_logging;

/// Current wall clock in nanoseconds since epoch, for latency readouts.
pub fn now_ns() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
}
