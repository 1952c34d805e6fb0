use anyhow::{Context, Result};
use lofty::prelude::*;
use lofty::read_from_path;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Reads the playing time of an audio file.
///
/// Used to enrich records during a scan. Callers go through
/// [`duration_or_zero`] so a failure never drops the record.
pub trait DurationReader: Send + Sync {
    fn read_duration(&self, path: &Path) -> Result<Duration>;
}

/// Reads duration from the container's audio properties (MP3 frames, WAV header, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyDurationReader;

impl DurationReader for LoftyDurationReader {
    fn read_duration(&self, path: &Path) -> Result<Duration> {
        let tagged_file = read_from_path(path).context("Failed to read audio file")?;
        Ok(tagged_file.properties().duration())
    }
}

pub fn duration_or_zero(reader: &dyn DurationReader, path: &Path) -> Duration {
    match reader.read_duration(path) {
        Ok(duration) => duration,
        Err(e) => {
            debug!(path = %path.display(), error = %format!("{e:#}"), "could not read duration");
            Duration::ZERO
        }
    }
}
