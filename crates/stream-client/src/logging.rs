use tracing::{info, Level};

pub fn setup_console_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // try_init so tests and repeated calls don't panic.
    let _ = tracing_subscriber::fmt()
        .with_level(true)
        .with_target(true)
        .with_max_level(level)
        .try_init();

    info!("console logging initialized with level: {level}");
}
