use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "labor_dashboard=info,dashboard_server=info";

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`.
///
/// Logs go to stderr so stdout stays clean for JSON output and the TUI.
pub fn init_logging(default_filter: Option<&str>) {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
