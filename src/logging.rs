//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so interactive runs log to a file; CLI
//! subcommands log to stderr.

use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Level from `-v` flags, if any were given.
pub fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// `RUST_LOG` wins, then the explicit level.
fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init(level: &str, target: &LogTarget) -> Result<()> {
    match target {
        LogTarget::Stderr => init_with_writer(level, io::stderr, true),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            init_with_writer(level, Mutex::new(file), false)
        }
    }
}

fn init_with_writer<W>(level: &str, writer: W, with_ansi: bool) -> Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .compact()
        .with_writer(writer)
        .with_ansi(with_ansi)
        .with_target(false);

    tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(layer)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))
}

/// Sends panic messages to the log instead of stderr while alive.
///
/// Stderr is the TUI's alternate screen in raw mode. Dropping the guard
/// reinstates the default hook.
pub struct PanicLogGuard(());

impl PanicLogGuard {
    pub fn install() -> Self {
        panic::set_hook(Box::new(|info| {
            tracing::error!(%info, "panic");
        }));
        Self(())
    }
}

impl Drop for PanicLogGuard {
    fn drop(&mut self) {
        drop(panic::take_hook());
    }
}
