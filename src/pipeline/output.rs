//! Output placement: where the converted file goes and how it is written.

use crate::error::ConvertorioError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<input dir>/<input stem>.<target_format>`.
///
/// `./photo.png` + `jpg` → `./photo.jpg`.
pub fn default_output_path(input: &Path, target_format: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{stem}.{target_format}");
    match input.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Write `bytes` to `path`, creating parent directories, and return the
/// on-disk size.
///
/// Uses atomic write (temp file + rename) so an interrupted download never
/// leaves a truncated file at `path`.
pub async fn write_output(path: &Path, bytes: &[u8]) -> Result<u64, ConvertorioError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertorioError::io(parent, e))?;
    }

    let tmp_path = temp_sibling(path);
    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(ConvertorioError::io(&tmp_path, e));
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(ConvertorioError::io(path, e));
    }

    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| ConvertorioError::io(path, e))?
        .len();
    debug!("Wrote {} bytes to {}", size, path.display());
    Ok(size)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_replaces_extension() {
        assert_eq!(
            default_output_path(Path::new("./photo.png"), "jpg"),
            PathBuf::from("./photo.jpg")
        );
        assert_eq!(
            default_output_path(Path::new("/data/in/scan.final.tiff"), "pdf"),
            PathBuf::from("/data/in/scan.final.pdf")
        );
    }

    #[test]
    fn default_output_without_directory() {
        assert_eq!(
            default_output_path(Path::new("icon.svg"), "ico"),
            PathBuf::from("icon.ico")
        );
    }

    #[test]
    fn default_output_without_extension() {
        assert_eq!(
            default_output_path(Path::new("/tmp/README"), "pdf"),
            PathBuf::from("/tmp/README.pdf")
        );
    }

    #[tokio::test]
    async fn write_creates_parent_dirs_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c/out.webp");
        let size = write_output(&path, &[7u8; 1234]).await.unwrap();
        assert_eq!(size, 1234);
        assert_eq!(std::fs::read(&path).unwrap().len(), 1234);
        assert!(!temp_sibling(&path).exists(), "temp file must be renamed away");
    }

    #[tokio::test]
    async fn write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        std::fs::write(&path, b"old contents that are longer").unwrap();
        let size = write_output(&path, b"new").await.unwrap();
        assert_eq!(size, 3);
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    // /dev/full accepts the open and fails every write with ENOSPC.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn failed_write_leaves_no_partial_file() {
        if !Path::new("/dev/full").exists() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let tmp = temp_sibling(&path);
        std::os::unix::fs::symlink("/dev/full", &tmp).unwrap();

        let err = write_output(&path, &[1u8; 4096]).await.unwrap_err();
        assert!(matches!(err, ConvertorioError::Io { .. }), "got: {err:?}");
        assert!(std::fs::symlink_metadata(&tmp).is_err(), "temp sibling left behind");
        assert!(!path.exists());
    }
}
