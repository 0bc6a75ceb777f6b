//! Logging setup
//!
//! Filtering follows `RUST_LOG` (default `warn`), e.g.
//! `RUST_LOG=codelines::code=debug` to time full builds.
//!
//! With a log file, output goes there without ANSI colours so it does not
//! fight the pager for the terminal. Otherwise logs go to stderr.

use std::path::Path;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{CodeError, Result};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let layer = match log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir,
                _ => Path::new("."),
            };
            let file_name = path
                .file_name()
                .ok_or_else(|| CodeError::Message(format!("invalid log file: {}", path.display())))?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            fmt::layer()
                .with_writer(appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(env_filter())
                .boxed()
        }
        None => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(env_filter())
            .boxed(),
    };

    // Already initialised (tests, repeated calls): keep the first subscriber
    let _ = tracing_subscriber::registry().with(layer).try_init();
    Ok(())
}
