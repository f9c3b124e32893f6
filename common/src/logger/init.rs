use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Output flavour of the process-wide subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, one event per line.
    Compact,
    /// Newline-delimited JSON for log shippers.
    Json,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_level`. Calling this more than once is a no-op,
/// so tests and the binary can both call it freely.
pub fn init_logger(service_name: &'static str, default_level: &str, format: LogFormat) {
    LOGGER_INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .with_line_number(true);

        // A subscriber may already be installed by a test harness.
        let installed = match format {
            LogFormat::Json => builder.json().try_init().is_ok(),
            LogFormat::Compact => builder.compact().try_init().is_ok(),
        };

        if installed {
            tracing::info!(service = service_name, ?format, "logger initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logger("test", "debug", LogFormat::Compact);
        init_logger("test", "trace", LogFormat::Json);
        assert!(LOGGER_INIT.get().is_some());
    }
}
