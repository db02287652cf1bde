//! Logger initialization.

use std::io::Write;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;
use colored::*;
use log::LevelFilter;

/// Dependencies whose logging is clamped regardless of the requested level.
///
/// HTML parsing warns on every malformed tag, and the browser protocol crates
/// log each CDP message at debug level.
const CLAMPED_MODULES: &[(&str, LevelFilter)] = &[
    ("html5ever", LevelFilter::Error),
    ("selectors", LevelFilter::Warn),
    ("reqwest", LevelFilter::Info),
    ("hyper", LevelFilter::Info),
    ("hyper_util", LevelFilter::Info),
    ("chromiumoxide", LevelFilter::Warn),
    ("tungstenite", LevelFilter::Warn),
    ("async_tungstenite", LevelFilter::Warn),
];

/// Initializes the logger with the specified level and format.
///
/// The logger reads `RUST_LOG` first; `level` then overrides it, so
/// `RUST_LOG=debug` works for quick debugging while `--log-level` stays
/// authoritative.
///
/// # Errors
///
/// Returns `InitializationError::LoggerError` if a logger is already installed.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=tag_inspector=debug tag_inspector check example.com
/// tag_inspector --log-format json crawl example.com
/// ```
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    for (module, clamp) in CLAMPED_MODULES {
        builder.filter_module(module, (*clamp).min(level));
    }
    builder.filter_module("tag_inspector", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(
                        chrono::Utc::now().timestamp_millis(),
                        record.level(),
                        record.target(),
                        &record.args().to_string()
                    )
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };

                writeln!(
                    buf,
                    "{} [{}] {}",
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init: tests initialize the logger more than once per process
    builder.try_init().map_err(InitializationError::from)?;

    Ok(())
}

/// One structured log line: `{"ts":..,"level":..,"target":..,"msg":..}`.
fn json_line(ts: i64, level: log::Level, target: &str, msg: &str) -> String {
    serde_json::json!({
        "ts": ts,
        "level": level.as_str(),
        "target": target,
        "msg": msg,
    })
    .to_string()
}
