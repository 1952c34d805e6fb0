use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Maximum size per log file before rotation (~5 MB)
const MAX_LOG_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// Number of rotated log files to keep
const MAX_LOG_FILES: usize = 5;
/// In-memory notification buffer cap
const MAX_MEMORY_ENTRIES: usize = 2000;
const LOG_FILE_NAME: &str = "recordings.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Error => "ERROR",
        }
    }
}

/// Receives user-facing messages (the front end renders them as toasts or a status line).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub message: String,
}

/// Notification history on disk: `recordings.log` is written to, and
/// `recordings.<n>.log` holds the n-th older generation.
#[derive(Debug)]
struct LogFile {
    dir: PathBuf,
}

impl LogFile {
    fn create(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn generation(&self, n: usize) -> PathBuf {
        match n {
            0 => self.dir.join(LOG_FILE_NAME),
            n => self.dir.join(format!("recordings.{n}.log")),
        }
    }

    fn active(&self) -> PathBuf {
        self.generation(0)
    }

    fn is_full(&self) -> bool {
        fs::metadata(self.active()).is_ok_and(|m| m.len() >= MAX_LOG_FILE_SIZE)
    }

    /// Age every generation by one. The oldest one is discarded.
    fn rotate(&self) -> io::Result<()> {
        let oldest = self.generation(MAX_LOG_FILES);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (0..MAX_LOG_FILES).rev() {
            let from = self.generation(n);
            if from.exists() {
                fs::rename(&from, self.generation(n + 1))?;
            }
        }
        Ok(())
    }

    fn append(&self, level: &str, message: &str) -> io::Result<()> {
        if self.is_full() {
            self.rotate()?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(self.active())?;
        writeln!(
            file,
            "[{}] [{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            message
        )
    }
}

/// Notification sink that keeps recent entries in memory and, once a log
/// directory is set, appends them to a rotating file.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<NotificationEntry>>,
    file: Mutex<Option<LogFile>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start persisting notifications under `dir`. A directory that cannot
    /// be created leaves the log memory-only.
    pub fn init_log_dir<P: AsRef<Path>>(&self, dir: P) {
        let dir = dir.as_ref();
        let file = match LogFile::create(dir) {
            Ok(file) => file,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to create log directory");
                return;
            }
        };

        let marker = format!(
            "=== Recording catalog session started at {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S %Z")
        );
        if let Err(e) = file.append("INFO", &marker) {
            warn!(path = %file.active().display(), error = %e, "failed to write log file");
        }
        *self.file.lock().unwrap_or_else(|e| e.into_inner()) = Some(file);
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.file.lock().ok()?.as_ref().map(|f| f.dir.clone())
    }

    /// The file currently appended to.
    pub fn current_log_path(&self) -> Option<PathBuf> {
        self.file.lock().ok()?.as_ref().map(LogFile::active)
    }

    pub fn entries(&self) -> Vec<NotificationEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<NotificationEntry> {
        self.entries.lock().ok()?.last().cloned()
    }

    fn persist(&self, severity: Severity, message: &str) {
        let Ok(guard) = self.file.lock() else { return };
        let Some(file) = guard.as_ref() else { return };
        if let Err(e) = file.append(severity.as_str(), message) {
            warn!(path = %file.active().display(), error = %e, "failed to write log file");
        }
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(target: "notifications", "{}", message),
            _ => info!(target: "notifications", severity = severity.as_str(), "{}", message),
        }

        let entry = NotificationEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            severity,
            message: message.to_string(),
        };

        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
            if entries.len() > MAX_MEMORY_ENTRIES {
                let drain_count = MAX_MEMORY_ENTRIES / 5;
                entries.drain(..drain_count);
            }
        }

        self.persist(severity, message);
    }
}
