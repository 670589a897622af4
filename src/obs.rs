//! Logging setup.

use anyhow::Context;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::{time::ChronoLocal, writer::BoxMakeWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Timestamp layout of every log line.
pub const LOG_TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the default filter. With `log_file` set, lines are
/// appended to that file without ANSI colours; otherwise they go to stdout.
pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scoring_api=info,tower_http=info".into());

    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
                .with_ansi(log_file.is_none())
                .with_writer(writer),
        )
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(())
}
