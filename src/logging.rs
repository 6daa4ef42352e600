//! Tracing subscriber setup shared by both binaries.
//!
//! Events go to `<log-dir>/<file_name>` (no rotation) and, unless disabled, to
//! stderr. `RUST_LOG` overrides the CLI level when set.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::cli::LogArgs;
use crate::error::{HousingError, Result};

pub fn init_logging(args: &LogArgs, file_name: &str) -> Result<()> {
    let level = args.log_level.to_filter();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,housing_prep={level}")));

    let file_layer = match args.file_dir() {
        Some(dir) => Some(
            fmt::layer()
                .with_writer(file_appender(dir, file_name)?)
                .with_ansi(false)
                .with_timer(SystemTime)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        ),
        None => None,
    };

    let console_layer = (!args.no_console_log).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(SystemTime)
            .with_target(false)
    });

    Registry::default()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| HousingError::Config(format!("Failed to initialize logging: {e}")))
}

fn file_appender(dir: &Path, file_name: &str) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .map_err(|e| HousingError::io(format!("Failed to create log directory '{}'", dir.display()), e))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| HousingError::Config(format!("Failed to open log file in '{}': {e}", dir.display())))
}
