//! Logging initialization: stdout plus an optional rolling file.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// When `MAESTRO_LOG_DIR` is set, a daily-rolling file appender is added.
/// `tracing_appender::rolling::daily` panics if it cannot create the
/// initial log file, so writability is preflighted first.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", default_level)));

    let file_layer = match std::env::var("MAESTRO_LOG_DIR") {
        Ok(log_dir) if std::fs::create_dir_all(&log_dir).is_ok() => {
            let test_path = std::path::Path::new(&log_dir).join(".maestro_write_test");
            match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&test_path)
            {
                Ok(_) => {
                    let _ = std::fs::remove_file(&test_path);

                    let file_appender = tracing_appender::rolling::daily(&log_dir, "maestro.log");
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                    // Keep the guard alive for the process lifetime
                    Box::leak(Box::new(guard));

                    Some(
                        tracing_subscriber::fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false)
                            .with_target(true),
                    )
                }
                Err(e) => {
                    eprintln!(
                        "Warning: could not write to log directory {} ({}), file logging disabled",
                        log_dir, e
                    );
                    None
                }
            }
        }
        Ok(log_dir) => {
            eprintln!(
                "Warning: could not create log directory {}, file logging disabled",
                log_dir
            );
            None
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();
}
