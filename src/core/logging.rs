//! Logging setup.
//!
//! stdout carries the MCP protocol, so diagnostics go to stderr or, through a
//! non-blocking writer, to a log file.

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, fmt::writer::BoxMakeWriter};

use super::config::LoggingConfig;
use super::error::{Error, Result};

/// Install the global subscriber described by `config`.
///
/// When logging to a file, the returned guard flushes pending lines on drop
/// and must be held until the process is done logging.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::from_default_env().add_directive(parse_level(config.effective_level()).into());

    let (writer, guard, ansi) = match &config.file {
        Some(path) => {
            let (non_blocking, guard) = file_writer(path)?;
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, true),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(ansi)
        .with_writer(writer)
        .init();

    Ok(guard)
}

/// Open `path` for appending behind a background writer thread.
pub fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path.file_name().ok_or_else(|| {
        Error::config(format!("Log file path {} has no file name", path.display()))
    })?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| Error::config(format!("Cannot open log file {}: {e}", path.display())))?;

    Ok(tracing_appender::non_blocking(appender))
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_file_writer_appends_and_flushes_on_guard_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aggregator.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let (mut writer, guard) = file_writer(&path).unwrap();
        writer.write_all(b"child server ready\n").unwrap();
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "earlier run\nchild server ready\n");
    }

    #[test]
    fn test_file_writer_rejects_missing_file_name() {
        let err = file_writer(Path::new("/")).unwrap_err();
        assert!(err.to_string().contains("no file name"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }
}
