//! Error log and access log sinks.
//!
//! Every entry is mirrored to the `log` facade for console output. When file
//! logging is enabled, entries are also appended to the error log or access
//! log. Each file is rotated once it reaches its configured line count: the
//! full file is renamed to `<name>_<n>` (the next unused `n`) and a new one
//! is started.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use log::{error, log};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;

use crate::config::Config;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Severity of an error log entry, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Verbose,
    Info,
    Warn,
    Severe,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Verbose => "VERBOSE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Severe => "SEVERE",
            Severity::Fatal => "FATAL",
        }
    }

    /// The `log` level used when mirroring to the console.
    pub fn log_level(&self) -> log::Level {
        match self {
            Severity::Debug => log::Level::Trace,
            Severity::Verbose => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Severe | Severity::Fatal => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Severity::Debug),
            "VERBOSE" => Ok(Severity::Verbose),
            "INFO" => Ok(Severity::Info),
            "WARN" => Ok(Severity::Warn),
            "SEVERE" => Ok(Severity::Severe),
            "FATAL" => Ok(Severity::Fatal),
            _ => Err(format!("Unknown log level: {s}")),
        }
    }
}

/// File logging settings, read from the `logging` config section.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub enabled: bool,
    pub http_log_path: PathBuf,
    pub http_log_max_lines: usize,
    pub error_log_path: PathBuf,
    pub error_log_max_lines: usize,
    pub min_level: Severity,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            http_log_path: PathBuf::from("./http_log"),
            http_log_max_lines: 150,
            error_log_path: PathBuf::from("./error_log"),
            error_log_max_lines: 150,
            min_level: Severity::Warn,
        }
    }
}

impl LogConfig {
    pub fn from_config(section: &Config) -> Self {
        let http_dir = section.get_string_or("http-log-file-path", ".");
        let http_name = section.get_string_or("http-log-file-name", "http_log");
        let error_dir = section.get_string_or("error-log-file-path", ".");
        let error_name = section.get_string_or("error-log-file-name", "error_log");
        let min_level = section.get_string_or("error-log-minlevel", "WARN");

        Self {
            enabled: section.get_bool_or("enabled", true),
            http_log_path: Path::new(&http_dir).join(http_name),
            http_log_max_lines: section.get_int_or("http-log-file-max-length", 150).max(0) as usize,
            error_log_path: Path::new(&error_dir).join(error_name),
            error_log_max_lines: section.get_int_or("error-log-file-max-length", 150).max(0) as usize,
            min_level: min_level.parse().unwrap_or_else(|e| {
                log::warn!("{e}, using WARN");
                Severity::Warn
            }),
        }
    }
}

/// The server-wide log sink. Safe to share between connections.
pub struct ServerLog {
    debug: bool,
    min_level: Severity,
    errors: Option<RotatingFile>,
    access: Option<RotatingFile>,
}

impl ServerLog {
    /// Open (creating if needed) the configured log files.
    pub fn open(config: &LogConfig, debug: bool) -> io::Result<Self> {
        let (errors, access) = if config.enabled {
            (
                Some(RotatingFile::open(&config.error_log_path, config.error_log_max_lines)?),
                Some(RotatingFile::open(&config.http_log_path, config.http_log_max_lines)?),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            debug,
            min_level: config.min_level,
            errors,
            access,
        })
    }

    /// A sink that only mirrors to the console.
    pub fn console_only(min_level: Severity, debug: bool) -> Self {
        Self {
            debug,
            min_level,
            errors: None,
            access: None,
        }
    }

    pub fn is_debugging(&self) -> bool {
        self.debug
    }

    /// Record an error log entry. `client` may be empty.
    pub fn error_log(&self, level: Severity, client: &str, message: impl fmt::Display) {
        if client.is_empty() {
            log!(level.log_level(), "{message}");
        } else {
            log!(level.log_level(), "[client {client}] {message}");
        }

        if level < self.min_level && !self.debug {
            return;
        }
        if let Some(file) = &self.errors {
            let line = format!(
                "[{}] [{level}] [client {client}] : {message}",
                Local::now().format(TIMESTAMP_FORMAT)
            );
            if let Err(e) = file.append(&line) {
                error!("Failed to write error log {}: {e}", file.path.display());
            }
        }
    }

    pub fn debug(&self, client: &str, message: impl fmt::Display) {
        self.error_log(Severity::Debug, client, message);
    }

    pub fn verbose(&self, client: &str, message: impl fmt::Display) {
        self.error_log(Severity::Verbose, client, message);
    }

    pub fn info(&self, client: &str, message: impl fmt::Display) {
        self.error_log(Severity::Info, client, message);
    }

    pub fn warn(&self, client: &str, message: impl fmt::Display) {
        self.error_log(Severity::Warn, client, message);
    }

    pub fn severe(&self, client: &str, message: impl fmt::Display) {
        self.error_log(Severity::Severe, client, message);
    }

    pub fn fatal(&self, client: &str, message: impl fmt::Display) {
        self.error_log(Severity::Fatal, client, message);
    }

    /// Record one completed request in the access log.
    pub fn http_access_log(&self, ip: &str, hostname: &str, request_line: &str, status: u16) {
        let line = format_access_line(ip, hostname, &Local::now().format(TIMESTAMP_FORMAT).to_string(), request_line, status);
        log::info!(target: "access", "{}", line.trim_end());

        if let Some(file) = &self.access {
            if let Err(e) = file.append(&line) {
                error!("Failed to write access log {}: {e}", file.path.display());
            }
        }
    }
}

fn format_access_line(ip: &str, hostname: &str, timestamp: &str, request_line: &str, status: u16) -> String {
    format!("{ip:<27} {hostname:<40} {timestamp:<23} {request_line:<60} {status:>7} ")
}

/// An append-only file that rotates after `max_lines` lines.
struct RotatingFile {
    path: PathBuf,
    max_lines: usize,
    state: Mutex<FileState>,
}

struct FileState {
    file: File,
    lines: usize,
}

impl RotatingFile {
    fn open(path: &Path, max_lines: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let lines = fs::read(path)?.iter().filter(|&&b| b == b'\n').count();

        Ok(Self {
            path: path.to_path_buf(),
            max_lines,
            state: Mutex::new(FileState { file, lines }),
        })
    }

    fn append(&self, line: &str) -> io::Result<()> {
        run_blocking(|| -> io::Result<()> {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            writeln!(state.file, "{line}")?;
            state.file.flush()?;
            state.lines += 1;

            if self.max_lines > 0 && state.lines >= self.max_lines {
                self.rotate(&mut state)?;
            }
            Ok(())
        })
    }

    // Renames the full file aside and starts a fresh one at the same path.
    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        let target = next_rotation_path(&self.path);
        fs::rename(&self.path, &target)?;
        state.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        state.lines = 0;
        Ok(())
    }
}

/// Run blocking file I/O, yielding the worker thread when called from a
/// multi-threaded runtime.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => block_in_place(f),
        _ => f(),
    }
}

fn next_rotation_path(path: &Path) -> PathBuf {
    let mut n = 1;
    loop {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(format!("_{n}"));
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path, max_lines: usize, min_level: Severity) -> LogConfig {
        LogConfig {
            enabled: true,
            http_log_path: dir.join("http_log"),
            http_log_max_lines: max_lines,
            error_log_path: dir.join("error_log"),
            error_log_max_lines: max_lines,
            min_level,
        }
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn test_severity_order_and_parse() {
        assert!(Severity::Debug < Severity::Verbose);
        assert!(Severity::Severe < Severity::Fatal);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("VERBOSE".parse::<Severity>().unwrap(), Severity::Verbose);
        assert!("LOUD".parse::<Severity>().is_err());
    }

    #[test]
    fn test_min_level_filters_error_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = ServerLog::open(&config_in(dir.path(), 0, Severity::Warn), false).unwrap();

        log.verbose("10.0.0.1", "quiet");
        log.info("10.0.0.1", "still quiet");
        log.warn("10.0.0.1", "loud");
        log.severe("", "louder");

        let contents = read(dir.path().join("error_log"));
        assert!(!contents.contains("quiet"));
        assert!(contents.contains("[WARN] [client 10.0.0.1] : loud"));
        assert!(contents.contains("[SEVERE] [client ] : louder"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_debug_mode_writes_every_level() {
        let dir = tempfile::tempdir().unwrap();
        let log = ServerLog::open(&config_in(dir.path(), 0, Severity::Fatal), true).unwrap();
        assert!(log.is_debugging());

        log.debug("", "headers");
        log.verbose("", "received");

        let contents = read(dir.path().join("error_log"));
        assert!(contents.contains("[DEBUG]"));
        assert!(contents.contains("[VERBOSE]"));
    }

    #[test]
    fn test_access_log_columns() {
        let dir = tempfile::tempdir().unwrap();
        let log = ServerLog::open(&config_in(dir.path(), 0, Severity::Warn), false).unwrap();

        log.http_access_log("127.0.0.1", "localhost", "GET /index.html HTTP/1.1", 200);

        let contents = read(dir.path().join("http_log"));
        let line = contents.lines().next().unwrap();
        assert!(line.starts_with("127.0.0.1 "));
        assert_eq!(&line[28..37], "localhost");
        assert!(line.contains("GET /index.html HTTP/1.1"));
        assert!(line.trim_end().ends_with("200"));
    }

    #[test]
    fn test_format_access_line_is_fixed_width() {
        let line = format_access_line("1.2.3.4", "host", "01/01/2026 00:00:00", "GET / HTTP/1.1", 404);
        assert_eq!(line.len(), 27 + 1 + 40 + 1 + 23 + 1 + 60 + 1 + 7 + 1);
        assert!(line.ends_with("    404 "));
    }

    #[test]
    fn test_rotation_moves_full_file_aside() {
        let dir = tempfile::tempdir().unwrap();
        let log = ServerLog::open(&config_in(dir.path(), 2, Severity::Debug), false).unwrap();

        log.warn("", "one");
        log.warn("", "two");
        log.warn("", "three");
        log.warn("", "four");
        log.warn("", "five");

        let first = read(dir.path().join("error_log_1"));
        let second = read(dir.path().join("error_log_2"));
        let current = read(dir.path().join("error_log"));
        assert!(first.contains("one") && first.contains("two"));
        assert!(second.contains("three") && second.contains("four"));
        assert_eq!(current.lines().count(), 1);
        assert!(current.contains("five"));
    }

    #[test]
    fn test_rotation_counts_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("http_log"), "old 1\nold 2\n").unwrap();
        let log = ServerLog::open(&config_in(dir.path(), 3, Severity::Warn), false).unwrap();

        log.http_access_log("1.1.1.1", "-", "GET / HTTP/1.1", 200);

        let rotated = read(dir.path().join("http_log_1"));
        assert!(rotated.starts_with("old 1"));
        assert_eq!(rotated.lines().count(), 3);
        assert!(read(dir.path().join("http_log")).is_empty());
    }

    #[test]
    fn test_disabled_logging_creates_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path(), 0, Severity::Debug);
        config.enabled = false;
        let log = ServerLog::open(&config, false).unwrap();

        log.fatal("", "nothing on disk");
        log.http_access_log("1.1.1.1", "-", "GET / HTTP/1.1", 200);

        assert!(!dir.path().join("error_log").exists());
        assert!(!dir.path().join("http_log").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_rotation_on_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let log = ServerLog::open(&config_in(dir.path(), 2, Severity::Warn), false).unwrap();

        for n in 0..3 {
            log.http_access_log("1.1.1.1", "-", &format!("GET /{n} HTTP/1.1"), 200);
        }

        let rotated = read(dir.path().join("http_log_1"));
        assert!(rotated.contains("GET /0") && rotated.contains("GET /1"));
        assert!(read(dir.path().join("http_log")).contains("GET /2"));
    }

    #[test]
    fn test_log_config_from_section() {
        let yaml = "enabled: false\nhttp-log-file-path: /tmp/x\nerror-log-minlevel: SEVERE\nerror-log-file-max-length: 10\n";
        let config = LogConfig::from_config(&Config::from_yaml(yaml).unwrap());
        assert!(!config.enabled);
        assert_eq!(config.http_log_path, PathBuf::from("/tmp/x/http_log"));
        assert_eq!(config.error_log_path, PathBuf::from("./error_log"));
        assert_eq!(config.error_log_max_lines, 10);
        assert_eq!(config.min_level, Severity::Severe);
    }
}
