use anyhow::{Context, Result};
use recording_catalog::{Catalog, CatalogConfig, NotificationLog, Period};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: scan_recordings <dir|config.json> [all|today|week|month] [search]");
        return Ok(());
    }

    let source = PathBuf::from(&args[1]);
    let config = if source.extension().is_some_and(|e| e == "json") {
        CatalogConfig::load(&source).context("Failed to load catalog config")?
    } else {
        CatalogConfig::with_root(source)
    };
    let period: Period = args.get(2).and_then(|p| p.parse().ok()).unwrap_or_default();
    let search = args.get(3).cloned().unwrap_or_default();

    let log = Arc::new(NotificationLog::new());
    if let Some(dir) = &config.log_dir {
        log.init_log_dir(dir);
    }

    let mut catalog = Catalog::new(config).with_notifier(log);
    catalog
        .rescan()
        .with_context(|| format!("Failed to scan {}", catalog.root_dir().display()))?;
    catalog.set_period(period);
    catalog.set_search_text(&search);

    for record in catalog.filtered() {
        println!(
            "{}  {:<8}  {:<20}  {}  {:>9}  {}",
            record.date_display(),
            record.metadata.direction.as_str(),
            record.display_name(),
            record.duration_display(),
            record.file_size_display(),
            record.file_name()
        );
    }
    println!(
        "{} of {} recordings ({})",
        catalog.filtered().len(),
        catalog.total_count(),
        catalog.total_size()
    );

    Ok(())
}
