//! Input resolution: check the local source file before any network call.
//!
//! Everything here runs before the `start` event, so a missing or
//! unreadable file is reported without creating a job on the server.

use crate::error::ConvertorioError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated local input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub path: PathBuf,
    /// Final path component, sent to the server as `file_name`.
    pub file_name: String,
    /// Lower-cased extension without the dot; empty when there is none.
    pub source_format: String,
    pub size: u64,
}

impl ResolvedInput {
    /// Read the whole file.
    pub async fn read(&self) -> Result<Vec<u8>, ConvertorioError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| ConvertorioError::io(&self.path, e))
    }
}

/// Lower-cased extension of `path`, or an empty string.
pub fn source_format(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Check that `path` names a readable regular file and capture its metadata.
pub async fn resolve_input(path: &Path) -> Result<ResolvedInput, ConvertorioError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertorioError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ConvertorioError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    if !metadata.is_file() {
        return Err(ConvertorioError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    // Check read permission by attempting to open
    if let Err(e) = tokio::fs::File::open(path).await {
        return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
            ConvertorioError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            ConvertorioError::io(path, e)
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ConvertorioError::FileNotFound {
            path: path.to_path_buf(),
        })?;

    debug!("Resolved input: {} ({} bytes)", path.display(), metadata.len());
    Ok(ResolvedInput {
        path: path.to_path_buf(),
        file_name,
        source_format: source_format(path),
        size: metadata.len(),
    })
}
