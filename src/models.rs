use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    #[default]
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

/// What the file name tells us about a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub timestamp: NaiveDateTime, // Local wall-clock time of the call
    pub phone_number: String,     // Empty when it cannot be determined
    pub direction: Direction,
}

impl RecordingMetadata {
    /// Metadata for a name that could not be parsed at all.
    pub fn fallback(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            phone_number: String::new(),
            direction: Direction::Outgoing,
        }
    }
}

/// One audio file in the catalog. `file_path` is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub file_path: PathBuf,
    pub metadata: RecordingMetadata,
    pub file_size_bytes: u64,
    pub duration: Duration, // Zero unless a duration reader succeeded
    pub contact_name: Option<String>,
}

impl RecordingRecord {
    pub fn new(file_path: PathBuf, metadata: RecordingMetadata, file_size_bytes: u64) -> Self {
        Self {
            file_path,
            metadata,
            file_size_bytes,
            duration: Duration::ZERO,
            contact_name: None,
        }
    }

    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn phone_number(&self) -> &str {
        &self.metadata.phone_number
    }

    /// Contact name when one is known, the raw number otherwise.
    pub fn display_name(&self) -> &str {
        match self.contact_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.metadata.phone_number,
        }
    }

    /// Avatar letter: first character of the display name, or `?`.
    pub fn initial(&self) -> String {
        match self.display_name().chars().next() {
            Some(c) => c.to_uppercase().collect(),
            None => "?".to_string(),
        }
    }

    pub fn date_display(&self) -> String {
        self.metadata.timestamp.format("%d/%m/%Y %H:%M").to_string()
    }

    /// `mm:ss`; the minutes field wraps at one hour.
    pub fn duration_display(&self) -> String {
        let secs = self.duration.as_secs();
        format!("{:02}:{:02}", (secs / 60) % 60, secs % 60)
    }

    pub fn file_size_display(&self) -> String {
        format_file_size(self.file_size_bytes)
    }
}

/// Human readable size of a single recording (B, KB or MB).
pub fn format_file_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Like [`format_file_size`] but switches to GB for catalog totals.
pub fn format_total_size(bytes: u64) -> String {
    if bytes < GIB {
        format_file_size(bytes)
    } else {
        format!("{:.2} GB", bytes as f64 / GIB as f64)
    }
}
