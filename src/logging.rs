//! Logging setup shared by the binaries
//!
//! Stdout belongs to the monitoring scheduler, which reads the status line
//! from it, so logs go either to stderr (`--local`) or to a file in the log
//! directory.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use derive_more::From;
use structopt::StructOpt;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

#[derive(StructOpt, Debug)]
pub struct LogArgs {
    #[structopt(
        long = "local",
        help = "Log to stderr instead of the log directory. Use this when running by hand."
    )]
    pub local: bool,
    #[structopt(
        long = "log-dir",
        help = "Directory to write logs to",
        default_value = "/var/log/check-rhv",
        parse(from_os_str)
    )]
    pub log_dir: PathBuf,
}

#[derive(Debug, From)]
pub enum LogError {
    Io(io::Error),
    Appender(InitError),
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogError::Io(e) => write!(f, "{}", e),
            LogError::Appender(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LogError {}

/// Keeps logging alive for the rest of the invocation
///
/// Dropping it uninstalls the subscriber and then flushes any buffered
/// lines to the log file.
#[must_use]
pub struct LogGuard {
    _default: DefaultGuard,
    _flush: Option<WorkerGuard>,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr
pub fn stderr() -> LogGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(io::stderr)
        .finish();
    LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
        _flush: None,
    }
}

/// Set up logging as the command line asked for
///
/// `file_name` is the name of the log file inside `--log-dir`.
pub fn init(args: &LogArgs, file_name: &str) -> Result<LogGuard, LogError> {
    if args.local {
        return Ok(stderr());
    }
    fs::create_dir_all(&args.log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&args.log_dir)?;
    let (writer, flush) = tracing_appender::non_blocking(appender);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_ansi(false)
        .with_writer(writer)
        .finish();
    Ok(LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
        _flush: Some(flush),
    })
}

/// Like `init`, but fall back to stderr if the log directory is unusable
pub fn init_or_stderr(args: &LogArgs, file_name: &str) -> LogGuard {
    init(args, file_name).unwrap_or_else(|e| {
        eprintln!(
            "unable to log to {}: {}, logging to stderr",
            args.log_dir.display(),
            e
        );
        stderr()
    })
}

/// An error and all of its sources, outermost first
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        chain.push_str(": ");
        chain.push_str(&e.to_string());
        source = e.source();
    }
    chain
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let args = LogArgs::from_iter(&["log"]);
        assert!(!args.local);
        assert_eq!(args.log_dir, PathBuf::from("/var/log/check-rhv"));
    }

    #[test]
    fn error_chain_includes_sources() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "no such file");
        assert_eq!(error_chain(&LogError::Io(inner)), "no such file");

        let err = crate::rhv::api_url("https://").err().unwrap();
        assert_eq!(
            error_chain(&err),
            "invalid RHV manager url: empty host: empty host"
        );
    }

    #[test]
    fn local_logging_needs_no_directory() {
        let args = LogArgs::from_iter(&["log", "--local", "--log-dir", "/nonexistent/dir"]);
        let _guard = init(&args, "test.log").unwrap();
        tracing::info!("logging from a test");
    }
}
