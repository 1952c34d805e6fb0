pub mod catalog;
pub mod config;
pub mod error;
pub mod filename_parser;
pub mod filter;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod scanner;
pub mod share;
pub mod shared;

pub use catalog::{add_or_replace_record, remove_record, Catalog, CatalogEvent, CatalogObserver};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use filename_parser::parse_recording_name;
pub use filter::{apply_filter, Period, RecordingFilter};
pub use logging::{NotificationLog, Notifier, Severity};
pub use metadata::{DurationReader, LoftyDurationReader};
pub use models::{Direction, RecordingMetadata, RecordingRecord};
pub use scanner::{scan, ContactResolver, ScanJob};
pub use share::{ShareRequest, ShareTarget};
pub use shared::{RescanOutcome, SharedCatalog};
