use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures the catalog reports to its caller.
///
/// Unparseable file names and per-file stat errors during a scan are not
/// represented here: the former fall back to defaults and the latter are
/// skipped.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to create recordings directory {}: {source}", .path.display())]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read recordings directory {}: {source}", .path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Recording not found in catalog: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to delete {}: {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to export {} to {}: {source}", .path.display(), .destination.display())]
    Export {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to share {}: {reason}", .path.display())]
    Share { path: PathBuf, reason: String },

    #[error("Failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Path of the recording (or directory) the failure is about.
    pub fn path(&self) -> &PathBuf {
        match self {
            CatalogError::CreateRoot { path, .. }
            | CatalogError::RootUnreadable { path, .. }
            | CatalogError::NotFound { path }
            | CatalogError::Delete { path, .. }
            | CatalogError::Export { path, .. }
            | CatalogError::Share { path, .. }
            | CatalogError::ConfigRead { path, .. }
            | CatalogError::ConfigParse { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_path_and_cause() {
        let err = CatalogError::Delete {
            path: PathBuf::from("/rec/a.mp3"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/rec/a.mp3"));
        assert!(msg.contains("access denied"));
        assert_eq!(err.path(), &PathBuf::from("/rec/a.mp3"));
    }

    #[test]
    fn export_message_names_destination() {
        let err = CatalogError::Export {
            path: PathBuf::from("/rec/a.mp3"),
            destination: PathBuf::from("/out/a.mp3"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/out/a.mp3"));
    }
}
