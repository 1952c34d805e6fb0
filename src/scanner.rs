//! Recursive directory scan producing [`RecordingRecord`]s.

use crate::config::{accepts_extension, DEFAULT_EXTENSIONS};
use crate::error::{CatalogError, Result};
use crate::filename_parser::parse_recording_name;
use crate::metadata::{duration_or_zero, DurationReader};
use crate::models::RecordingRecord;
use chrono::{DateTime, Local, NaiveDateTime};
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Looks up a contact name for a phone number (address book, CRM, ...).
pub trait ContactResolver: Send + Sync {
    fn resolve(&self, phone_number: &str) -> Option<String>;
}

/// Everything needed to scan one root, detached from the catalog so it can
/// run without holding the catalog's lock.
#[derive(Clone)]
pub struct ScanJob {
    root: PathBuf,
    extensions: Vec<String>,
    duration_reader: Option<Arc<dyn DurationReader>>,
    contact_resolver: Option<Arc<dyn ContactResolver>>,
}

impl ScanJob {
    pub fn new<P: Into<PathBuf>>(root: P, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.to_vec(),
            duration_reader: None,
            contact_resolver: None,
        }
    }

    pub fn with_duration_reader(mut self, reader: Option<Arc<dyn DurationReader>>) -> Self {
        self.duration_reader = reader;
        self
    }

    pub fn with_contact_resolver(mut self, resolver: Option<Arc<dyn ContactResolver>>) -> Self {
        self.contact_resolver = resolver;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn accepts(&self, path: &Path) -> bool {
        accepts_extension(&self.extensions, path)
    }

    /// Scan the root, newest recording first.
    ///
    /// A missing root is created and yields an empty list. Only a failure to
    /// create or read the root itself is an error; files that cannot be
    /// stat'ed are skipped.
    pub fn run(&self) -> Result<Vec<RecordingRecord>> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|source| CatalogError::CreateRoot {
                path: self.root.clone(),
                source,
            })?;
            info!(root = %self.root.display(), "created recordings directory");
            return Ok(Vec::new());
        }

        fs::read_dir(&self.root).map_err(|source| CatalogError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;

        let mut records = Vec::new();
        // Linked files and folders count as recordings; walkdir reports link loops as errors
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(CatalogError::RootUnreadable {
                        path: self.root.clone(),
                        source: e.into(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }

            match self.record_for(entry.path()) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping recording"),
            }
        }

        records.sort_by(newest_first);
        info!(root = %self.root.display(), count = records.len(), "scanned recordings");
        Ok(records)
    }

    /// Build the record for a single file.
    pub fn record_for(&self, path: &Path) -> io::Result<RecordingRecord> {
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
        }
        let created = file_timestamp(&meta)?;

        let metadata = parse_recording_name(path, created);
        let mut record = RecordingRecord::new(path.to_path_buf(), metadata, meta.len());

        if let Some(reader) = &self.duration_reader {
            record.duration = duration_or_zero(reader.as_ref(), path);
        }
        if let Some(resolver) = &self.contact_resolver {
            record.contact_name = resolver.resolve(&record.metadata.phone_number);
        }

        debug!(path = %path.display(), number = %record.metadata.phone_number, "parsed recording");
        Ok(record)
    }
}

/// Scan `root` for recordings with the given extensions, no enrichment.
pub fn scan<P: AsRef<Path>>(root: P, extensions: &[String]) -> Result<Vec<RecordingRecord>> {
    ScanJob::new(root.as_ref(), extensions).run()
}

/// Scan `root` for `.mp3` and `.wav` recordings.
pub fn scan_default<P: AsRef<Path>>(root: P) -> Result<Vec<RecordingRecord>> {
    let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    scan(root, &extensions)
}

/// Creation time in local time, or modification time where the platform
/// does not record creation.
pub fn file_timestamp(meta: &fs::Metadata) -> io::Result<NaiveDateTime> {
    let time = meta.created().or_else(|_| meta.modified())?;
    Ok(DateTime::<Local>::from(time).naive_local())
}

/// Catalog order: timestamp descending, path ascending on ties.
pub fn newest_first(a: &RecordingRecord, b: &RecordingRecord) -> Ordering {
    b.metadata
        .timestamp
        .cmp(&a.metadata.timestamp)
        .then_with(|| a.file_path.cmp(&b.file_path))
}
