//! Logging init: file under the XDG state dir, or graceful fallback to stderr.

use anyhow::Result;
use std::fs;
use std::io;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Writer that is either the log file or stderr (used when the clone fails).
enum LogTarget {
    File(fs::File),
    Stderr,
}

impl io::Write for LogTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogTarget::File(f) => f.write(buf),
            LogTarget::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogTarget::File(f) => f.flush(),
            LogTarget::Stderr => io::stderr().lock().flush(),
        }
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,azkit_core=debug,azkit_cli=debug"))
}

/// Initialize structured logging to `~/.local/state/azkit/azkit.log`.
/// Returns Err when the state dir is unusable so the caller can fall back.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("azkit")?;
    let path = xdg_dirs.place_state_file("azkit.log")?;

    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    let writer = BoxMakeWriter::new(move || {
        file.try_clone()
            .map(LogTarget::File)
            .unwrap_or(LogTarget::Stderr)
    });

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::debug!("logging to {}", path.display());
    Ok(())
}

/// Stderr-only logging, for when the state dir cannot be written.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}
