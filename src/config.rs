use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "wav"];

/// Where recordings live and how they are scanned.
///
/// Every field has a default, so a config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub root_dir: PathBuf,
    pub extensions: Vec<String>, // Without the leading dot, compared case-insensitively
    pub read_durations: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            read_durations: true,
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    pub fn with_root<P: Into<PathBuf>>(root_dir: P) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CatalogError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// True when the file extension is one of the accepted audio extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        accepts_extension(&self.extensions, path)
    }
}

pub(crate) fn accepts_extension(extensions: &[String], path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|accepted| accepted.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// `~/SipLine/Recordings`, where the softphone writes its recordings, or a
/// relative folder when no home directory is known.
pub fn default_root_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("SipLine")
        .join("Recordings")
}
