use crate::catalog::{Catalog, CatalogEvent};
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescanOutcome {
    Completed(usize),
    /// Another scan was already running; this trigger was dropped.
    Skipped,
}

/// A [`Catalog`] shared between a UI thread and background scans.
///
/// At most one scan runs at a time. The catalog lock is only held to start
/// the scan and to install the result, so readers are not blocked while the
/// disk is walked. Deletes and file events that land in between are
/// replayed over the result.
#[derive(Clone)]
pub struct SharedCatalog {
    catalog: Arc<Mutex<Catalog>>,
    scanning: Arc<AtomicBool>,
}

/// Clears the scan flag even if the scan panics.
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            scanning: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Run `f` with exclusive access to the catalog.
    pub fn with<R>(&self, f: impl FnOnce(&mut Catalog) -> R) -> R {
        let mut catalog = self.catalog.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut catalog)
    }

    /// Rescan now, unless a scan is already in flight.
    pub fn request_rescan(&self) -> Result<RescanOutcome> {
        if self.scanning.swap(true, Ordering::SeqCst) {
            debug!("rescan skipped: scan already in progress");
            return Ok(RescanOutcome::Skipped);
        }
        let _guard = ScanGuard(&self.scanning);

        let job = self.with(|catalog| catalog.begin_scan());
        info!(root = %job.root().display(), "scanning recordings");
        let result = job.run();
        self.with(|catalog| catalog.finish_rescan(result))
            .map(RescanOutcome::Completed)
    }

    /// Dispatch an external trigger. Rescans go through
    /// [`request_rescan`](Self::request_rescan) so overlapping triggers
    /// collapse into the running scan.
    pub fn handle_event(&self, event: CatalogEvent) -> Result<()> {
        match event {
            CatalogEvent::Rescan => self.request_rescan().map(|_| ()),
            event => self.with(|catalog| catalog.handle_event(event)),
        }
    }

    /// Rescan on a background thread; the outcome arrives on the returned channel.
    pub fn spawn_rescan(&self) -> Receiver<Result<RescanOutcome>> {
        let (tx, rx) = channel();
        let shared = self.clone();
        thread::spawn(move || {
            let _ = tx.send(shared.request_rescan());
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::metadata::DurationReader;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc::{sync_channel, Sender, SyncSender};
    use std::time::Duration;

    /// Once armed, blocks the next duration read until the test releases it.
    struct Gate {
        armed: AtomicBool,
        entered: SyncSender<()>,
        release: Mutex<Receiver<()>>,
    }

    impl DurationReader for Gate {
        fn read_duration(&self, _path: &Path) -> anyhow::Result<Duration> {
            if self.armed.swap(false, Ordering::SeqCst) {
                let _ = self.entered.send(());
                let _ = self.release.lock().unwrap().recv();
            }
            Ok(Duration::ZERO)
        }
    }

    struct Gated {
        shared: SharedCatalog,
        gate: Arc<Gate>,
        entered: Receiver<()>,
        release: Sender<()>,
    }

    impl Gated {
        fn new(root: &Path) -> Self {
            let (entered_tx, entered) = sync_channel(1);
            let (release, release_rx) = channel();
            let gate = Arc::new(Gate {
                armed: AtomicBool::new(false),
                entered: entered_tx,
                release: Mutex::new(release_rx),
            });
            let reader: Arc<dyn DurationReader> = gate.clone();
            let shared = SharedCatalog::new(
                Catalog::new(CatalogConfig::with_root(root)).with_duration_reader(Some(reader)),
            );
            Self { shared, gate, entered, release }
        }

        /// Start a background scan and wait until it is parked on a file.
        fn start_blocked_scan(&self) -> Receiver<Result<RescanOutcome>> {
            self.gate.armed.store(true, Ordering::SeqCst);
            let pending = self.shared.spawn_rescan();
            self.entered.recv().unwrap();
            pending
        }
    }

    fn shared_in(root: &Path) -> SharedCatalog {
        let mut config = CatalogConfig::with_root(root);
        config.read_durations = false;
        SharedCatalog::new(Catalog::new(config))
    }

    fn recording(root: &Path, name: &str) -> PathBuf {
        let path = root.join(name);
        fs::write(&path, b"a").unwrap();
        path
    }

    #[test]
    fn request_rescan_completes() {
        let dir = tempfile::tempdir().unwrap();
        recording(dir.path(), "2024-03-15_14-30-00_0612.mp3");
        let shared = shared_in(dir.path());

        assert_eq!(shared.request_rescan().unwrap(), RescanOutcome::Completed(1));
        assert!(!shared.is_scanning());
        assert_eq!(shared.with(|c| c.total_count()), 1);
    }

    #[test]
    fn overlapping_rescan_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        recording(dir.path(), "2024-03-15_14-30-00_0612.mp3");
        let gated = Gated::new(dir.path());
        let shared = &gated.shared;

        let pending = gated.start_blocked_scan();
        assert!(shared.is_scanning());
        // The catalog stays readable mid-scan
        assert_eq!(shared.with(|c| c.total_count()), 0);
        assert_eq!(shared.request_rescan().unwrap(), RescanOutcome::Skipped);
        // A rescan event joins the running scan instead of scanning inline
        shared.handle_event(CatalogEvent::Rescan).unwrap();
        assert_eq!(shared.with(|c| c.total_count()), 0);

        gated.release.send(()).unwrap();
        assert_eq!(pending.recv().unwrap().unwrap(), RescanOutcome::Completed(1));
        assert!(!shared.is_scanning());
    }

    #[test]
    fn delete_during_scan_stays_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let doomed = recording(dir.path(), "2024-03-15_14-30-00_0612.mp3");
        let gated = Gated::new(dir.path());
        let shared = &gated.shared;
        shared.request_rescan().unwrap();

        let pending = gated.start_blocked_scan();
        shared.with(|c| c.delete_recording(&doomed)).unwrap();
        gated.release.send(()).unwrap();

        assert_eq!(pending.recv().unwrap().unwrap(), RescanOutcome::Completed(0));
        assert!(!doomed.exists());
        assert!(shared.with(|c| c.get(&doomed).is_none()));
        assert!(shared.with(|c| c.filtered().is_empty()));
    }

    #[test]
    fn file_created_during_scan_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let first = recording(dir.path(), "2024-03-15_14-30-00_0612.mp3");
        let gated = Gated::new(dir.path());
        let shared = &gated.shared;

        let pending = gated.start_blocked_scan();
        let second = recording(dir.path(), "2024-03-16_08-00-00_0700.mp3");
        shared.handle_event(CatalogEvent::FileCreated(second.clone())).unwrap();
        assert_eq!(shared.with(|c| c.total_count()), 1);
        gated.release.send(()).unwrap();

        assert_eq!(pending.recv().unwrap().unwrap(), RescanOutcome::Completed(2));
        let order: Vec<PathBuf> =
            shared.with(|c| c.records().iter().map(|r| r.file_path.clone()).collect());
        assert_eq!(order, vec![second, first]);
    }

    #[test]
    fn failed_background_scan_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("file");
        fs::write(&root, b"x").unwrap();
        let shared = shared_in(&root);

        let outcome = shared.spawn_rescan().recv().unwrap();
        assert!(outcome.is_err());
        assert!(!shared.is_scanning());
    }
}
