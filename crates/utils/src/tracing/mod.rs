use forcebridge_core::FORCEBRIDGE_LOG_VAR;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use ::tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// The filter comes from `FORCEBRIDGE_LOG` (falling back to `info`). Output
/// goes to stderr so that stdout stays free for command results; ANSI colours
/// are only used when stderr is a terminal.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_env(FORCEBRIDGE_LOG_VAR)
        .or_else(|_| EnvFilter::try_new("info"))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span for one CLI command execution
pub fn command_span(log_name: &str, execution_id: &str) -> Span {
    span!(Level::INFO, "command", log_name = %log_name, execution_id = %execution_id)
}

/// Emit the per-command duration metric
pub fn command_metric(log_name: &str, duration_ms: u64) {
    info!(
        log_name = %log_name,
        duration_ms = %duration_ms,
        "command_metric"
    );
}
