//! The recordings catalog: full collection, filtered view and the
//! operations that keep both in step with the disk.

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::filter::{Period, RecordingFilter};
use crate::logging::{Notifier, Severity};
use crate::metadata::{DurationReader, LoftyDurationReader};
use crate::models::{format_total_size, RecordingRecord};
use crate::scanner::{newest_first, ContactResolver, ScanJob};
use crate::share::{ShareRequest, ShareTarget};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Notified with the filtered view after every change.
pub trait CatalogObserver: Send + Sync {
    fn catalog_changed(&self, visible: &[RecordingRecord]);
}

impl<F> CatalogObserver for F
where
    F: Fn(&[RecordingRecord]) + Send + Sync,
{
    fn catalog_changed(&self, visible: &[RecordingRecord]) {
        self(visible)
    }
}

/// External triggers, typically from a file-system watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Rescan,
    FileCreated(PathBuf),
    FileDeleted(PathBuf),
    FileRenamed(PathBuf, PathBuf),
}

/// Remove the record for `path`. Absent paths are a no-op.
pub fn remove_record(records: &mut Vec<RecordingRecord>, path: &Path) -> Option<RecordingRecord> {
    let index = records.iter().position(|r| r.file_path == path)?;
    Some(records.remove(index))
}

/// Insert `record`, replacing any record with the same path, at its
/// newest-first position.
pub fn add_or_replace_record(
    records: &mut Vec<RecordingRecord>,
    record: RecordingRecord,
) -> Option<RecordingRecord> {
    let replaced = remove_record(records, &record.file_path);
    let index = records.partition_point(|existing| newest_first(existing, &record).is_lt());
    records.insert(index, record);
    replaced
}

/// Changes made to the catalog while a detached scan is walking the disk.
#[derive(Debug, Default)]
struct ScanLedger {
    removed: HashSet<PathBuf>,
    added: HashMap<PathBuf, RecordingRecord>,
}

impl ScanLedger {
    fn record_removed(&mut self, path: &Path) {
        self.added.remove(path);
        self.removed.insert(path.to_path_buf());
    }

    fn record_added(&mut self, record: &RecordingRecord) {
        self.removed.remove(&record.file_path);
        self.added.insert(record.file_path.clone(), record.clone());
    }

    /// Replay the changes on top of a scan result taken before they happened.
    fn reconcile(&self, records: &mut Vec<RecordingRecord>) {
        records.retain(|r| !self.removed.contains(&r.file_path));
        for record in self.added.values() {
            add_or_replace_record(records, record.clone());
        }
    }
}

pub struct Catalog {
    config: CatalogConfig,
    records: Vec<RecordingRecord>,
    filtered: Vec<RecordingRecord>,
    filter: RecordingFilter,
    duration_reader: Option<Arc<dyn DurationReader>>,
    contact_resolver: Option<Arc<dyn ContactResolver>>,
    notifier: Option<Arc<dyn Notifier>>,
    observers: Vec<Box<dyn CatalogObserver>>,
    ledger: Option<ScanLedger>,
}

impl Catalog {
    /// Empty catalog; call [`rescan`](Self::rescan) to populate it.
    pub fn new(config: CatalogConfig) -> Self {
        let duration_reader: Option<Arc<dyn DurationReader>> = if config.read_durations {
            Some(Arc::new(LoftyDurationReader))
        } else {
            None
        };
        Self {
            config,
            records: Vec::new(),
            filtered: Vec::new(),
            filter: RecordingFilter::default(),
            duration_reader,
            contact_resolver: None,
            notifier: None,
            observers: Vec::new(),
            ledger: None,
        }
    }

    pub fn with_duration_reader(mut self, reader: Option<Arc<dyn DurationReader>>) -> Self {
        self.duration_reader = reader;
        self
    }

    pub fn with_contact_resolver(mut self, resolver: Arc<dyn ContactResolver>) -> Self {
        self.contact_resolver = Some(resolver);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn subscribe(&mut self, observer: Box<dyn CatalogObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    pub fn records(&self) -> &[RecordingRecord] {
        &self.records
    }

    pub fn filtered(&self) -> &[RecordingRecord] {
        &self.filtered
    }

    pub fn filter(&self) -> &RecordingFilter {
        &self.filter
    }

    pub fn get(&self, path: &Path) -> Option<&RecordingRecord> {
        self.records.iter().find(|r| r.file_path == path)
    }

    pub fn total_count(&self) -> usize {
        self.records.len()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.file_size_bytes).sum()
    }

    pub fn total_size(&self) -> String {
        format_total_size(self.total_size_bytes())
    }

    /// Snapshot of what a scan of the configured root needs.
    pub fn scan_job(&self) -> ScanJob {
        ScanJob::new(&self.config.root_dir, &self.config.extensions)
            .with_duration_reader(self.duration_reader.clone())
            .with_contact_resolver(self.contact_resolver.clone())
    }

    /// Rebuild the catalog from disk. Returns the number of recordings found.
    ///
    /// Runs under the caller's borrow, so nothing can change the catalog
    /// meanwhile. An outstanding [`begin_scan`](Self::begin_scan) keeps its
    /// ledger.
    pub fn rescan(&mut self) -> Result<usize> {
        let result = self.scan_job().run();
        let ledger = self.ledger.take();
        let outcome = self.install(result, ledger.as_ref());
        self.ledger = ledger;
        outcome
    }

    /// Start a scan that runs without a borrow of the catalog.
    ///
    /// Deletions and additions made until [`finish_rescan`](Self::finish_rescan)
    /// are replayed over the scan result, so a file deleted mid-scan stays
    /// gone and one added mid-scan is kept.
    pub fn begin_scan(&mut self) -> ScanJob {
        self.ledger = Some(ScanLedger::default());
        self.scan_job()
    }

    /// Install the outcome of a scan started with [`begin_scan`](Self::begin_scan).
    ///
    /// On failure the catalog is left empty: nothing on disk could be
    /// confirmed.
    pub fn finish_rescan(&mut self, result: Result<Vec<RecordingRecord>>) -> Result<usize> {
        let ledger = self.ledger.take();
        self.install(result, ledger.as_ref())
    }

    fn install(
        &mut self,
        result: Result<Vec<RecordingRecord>>,
        ledger: Option<&ScanLedger>,
    ) -> Result<usize> {
        match result {
            Ok(mut records) => {
                if let Some(ledger) = ledger {
                    ledger.reconcile(&mut records);
                }
                self.records = records;
                info!(count = self.records.len(), "loaded recordings");
                self.refresh();
                Ok(self.records.len())
            }
            Err(e) => {
                error!(error = %e, "failed to load recordings");
                self.notify(&format!("Error: {}", e), Severity::Error);
                self.records.clear();
                self.refresh();
                Err(e)
            }
        }
    }

    pub fn set_period(&mut self, period: Period) {
        if self.filter.period != period {
            self.filter.period = period;
            self.refresh();
        }
    }

    pub fn set_search_text(&mut self, text: &str) {
        if self.filter.search_text != text {
            self.filter.search_text = text.to_string();
            self.refresh();
        }
    }

    pub fn set_filter(&mut self, filter: RecordingFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.refresh();
        }
    }

    /// Recompute the filtered view and tell observers.
    pub fn refresh(&mut self) {
        self.filtered = self.filter.apply(&self.records);
        self.publish();
    }

    /// Delete the file, then drop its record. The catalog is untouched if
    /// the file cannot be removed.
    pub fn delete_recording(&mut self, path: &Path) -> Result<()> {
        let file_name = self.require(path)?.file_name();

        if let Err(source) = fs::remove_file(path) {
            error!(path = %path.display(), error = %source, "delete failed");
            self.notify(&format!("Could not delete: {}", source), Severity::Error);
            return Err(CatalogError::Delete {
                path: path.to_path_buf(),
                source,
            });
        }

        remove_record(&mut self.records, path);
        remove_record(&mut self.filtered, path);
        if let Some(ledger) = &mut self.ledger {
            ledger.record_removed(path);
        }
        info!(file = %file_name, "deleted recording");
        self.notify("Recording deleted", Severity::Success);
        self.publish();
        Ok(())
    }

    /// Copy the recording to `destination`, overwriting it. A directory
    /// destination receives a file of the same name.
    pub fn export_recording(&self, path: &Path, destination: &Path) -> Result<PathBuf> {
        let record = self.require(path)?;
        let target = if destination.is_dir() {
            destination.join(record.file_name())
        } else {
            destination.to_path_buf()
        };

        match fs::copy(path, &target) {
            Ok(_) => {
                info!(source = %record.file_name(), destination = %target.display(), "exported recording");
                self.notify("Recording exported", Severity::Success);
                Ok(target)
            }
            Err(source) => {
                error!(path = %path.display(), error = %source, "export failed");
                self.notify(&format!("Could not export: {}", source), Severity::Error);
                Err(CatalogError::Export {
                    path: path.to_path_buf(),
                    destination: target,
                    source,
                })
            }
        }
    }

    pub fn share_recording(&self, path: &Path, target: &mut dyn ShareTarget) -> Result<()> {
        let record = self.require(path)?;
        let request = ShareRequest::for_record(record);

        if let Err(e) = request.send_to(target) {
            let reason = format!("{e:#}");
            error!(path = %path.display(), error = %reason, "share failed");
            self.notify(&format!("Error: {}", reason), Severity::Error);
            return Err(CatalogError::Share {
                path: path.to_path_buf(),
                reason,
            });
        }

        info!(file = %record.file_name(), "shared recording");
        self.notify("Recording ready to send", Severity::Info);
        Ok(())
    }

    /// Add a newly detected file without a full rescan. Returns whether a
    /// record was added or replaced.
    pub fn file_appeared(&mut self, path: &Path) -> bool {
        if !self.config.accepts(path) || !path.starts_with(&self.config.root_dir) {
            debug!(path = %path.display(), "ignoring file outside catalog");
            return false;
        }

        match self.scan_job().record_for(path) {
            Ok(record) => {
                if self.filter.matches(&record, chrono::Local::now().naive_local()) {
                    add_or_replace_record(&mut self.filtered, record.clone());
                } else {
                    remove_record(&mut self.filtered, path);
                }
                if let Some(ledger) = &mut self.ledger {
                    ledger.record_added(&record);
                }
                add_or_replace_record(&mut self.records, record);
                self.publish();
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "new recording not readable");
                false
            }
        }
    }

    /// Drop the record of a file that is gone from disk.
    pub fn file_disappeared(&mut self, path: &Path) -> bool {
        if let Some(ledger) = &mut self.ledger {
            ledger.record_removed(path);
        }
        if remove_record(&mut self.records, path).is_none() {
            return false;
        }
        remove_record(&mut self.filtered, path);
        self.publish();
        true
    }

    pub fn handle_event(&mut self, event: CatalogEvent) -> Result<()> {
        debug!(?event, "catalog event");
        match event {
            CatalogEvent::Rescan => self.rescan().map(|_| ()),
            CatalogEvent::FileCreated(path) => {
                self.file_appeared(&path);
                Ok(())
            }
            CatalogEvent::FileDeleted(path) => {
                self.file_disappeared(&path);
                Ok(())
            }
            CatalogEvent::FileRenamed(from, to) => {
                self.file_disappeared(&from);
                self.file_appeared(&to);
                Ok(())
            }
        }
    }

    fn require(&self, path: &Path) -> Result<&RecordingRecord> {
        self.get(path).ok_or_else(|| CatalogError::NotFound {
            path: path.to_path_buf(),
        })
    }

    fn notify(&self, message: &str, severity: Severity) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(message, severity);
        }
    }

    fn publish(&self) {
        for observer in &self.observers {
            observer.catalog_changed(&self.filtered);
        }
    }
}
