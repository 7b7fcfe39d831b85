//! Shared utilities for OCR backends.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::OcrError;

/// Hint shown when poppler-utils is missing.
pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Write uploaded bytes to a file inside `dir`, preserving the extension so
/// downstream tools can sniff the format from the name.
pub fn spool_upload(content: &[u8], filename: &str, dir: &Path) -> Result<PathBuf, OcrError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let path = dir.join(format!("upload.{}", extension.to_lowercase()));
    std::fs::write(&path, content).map_err(OcrError::Io)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_spool_upload_preserves_extension() {
        let temp = TempDir::new().unwrap();
        let path = spool_upload(b"fake", "Scan.PDF", temp.path()).unwrap();
        assert_eq!(path.extension().unwrap(), "pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"fake");
    }

    #[test]
    fn test_spool_upload_without_extension() {
        let temp = TempDir::new().unwrap();
        let path = spool_upload(b"fake", "noext", temp.path()).unwrap();
        assert_eq!(path.extension().unwrap(), "bin");
    }
}
