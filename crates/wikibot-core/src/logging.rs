//! Log file placement and subscriber setup.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Marker file present on shared Toolforge hosts.
pub const TOOLFORGE_MARKER: &str = "/etc/wmcs-project";

/// Returns true if the marker file at `marker` exists.
pub fn on_toolforge_at(marker: &Path) -> bool {
    std::fs::File::open(marker).is_ok()
}

/// Returns true when running on a shared Toolforge host.
pub fn on_toolforge() -> bool {
    on_toolforge_at(Path::new(TOOLFORGE_MARKER))
}

/// Process facts that decide where log files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEnvironment {
    /// Value of `$HOME`; `None` or empty means unset.
    pub home: Option<PathBuf>,
    /// Whether the process runs on a shared Toolforge host.
    pub on_toolforge: bool,
    /// Current working directory.
    pub cwd: PathBuf,
}

impl LogEnvironment {
    /// Capture the environment of the current process.
    pub fn detect() -> Result<Self> {
        Ok(Self {
            home: std::env::var_os("HOME").map(PathBuf::from),
            on_toolforge: on_toolforge(),
            cwd: std::env::current_dir()?,
        })
    }

    fn home_dir(&self) -> Option<&Path> {
        self.home
            .as_deref()
            .filter(|home| !home.as_os_str().is_empty())
    }
}

/// Resolve where `filename` should be written.
///
/// Absolute paths are returned unchanged. On Toolforge with a home directory
/// the file goes in `$HOME/logs`, which is created if needed. Otherwise it
/// goes in the working directory.
pub fn resolve_log_location(filename: &Path, env: &LogEnvironment) -> Result<PathBuf> {
    if filename.is_absolute() {
        return Ok(filename.to_path_buf());
    }
    if env.on_toolforge {
        if let Some(home) = env.home_dir() {
            let logs = home.join("logs");
            match std::fs::create_dir(&logs) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(logs.join(filename));
        }
    }
    Ok(env.cwd.join(filename))
}

/// Resolve `filename` against the current process environment.
pub fn get_log_location(filename: impl AsRef<Path>) -> Result<PathBuf> {
    let filename = filename.as_ref();
    if filename.is_absolute() {
        return Ok(filename.to_path_buf());
    }
    resolve_log_location(filename, &LogEnvironment::detect()?)
}

/// Keeps the background log writer alive. Drop it only at process exit.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: WorkerGuard,
    /// Resolved path prefix of the log file.
    pub path: PathBuf,
}

/// Install the global subscriber: stderr plus a daily-rotated log file.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_logging(filename: impl AsRef<Path>, level: &str) -> Result<LoggingGuard> {
    let path = get_log_location(filename)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let prefix = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("wikibot.log"));

    let appender = tracing_appender::rolling::daily(dir, prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    Ok(LoggingGuard { _file: guard, path })
}
