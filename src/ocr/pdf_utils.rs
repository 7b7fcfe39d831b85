//! Shared PDF rasterization utilities for OCR backends.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::OcrError;
use super::model_utils::PDFTOPPM_NOT_FOUND;

/// Get the number of pages in a PDF via pdfinfo.
pub fn pdf_page_count(pdf_path: &Path) -> Result<u32, OcrError> {
    let output = Command::new("pdfinfo").arg(pdf_path).output();

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            stdout
                .lines()
                .find_map(|line| {
                    line.strip_prefix("Pages:")
                        .and_then(|rest| rest.trim().parse::<u32>().ok())
                })
                .ok_or_else(|| {
                    OcrError::OcrFailed("pdfinfo did not report a page count".to_string())
                })
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(OcrError::OcrFailed(format!(
                "pdfinfo failed (corrupt PDF?): {}",
                stderr.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::BackendNotAvailable(
            "pdfinfo not found (install poppler-utils)".to_string(),
        )),
        Err(e) => Err(OcrError::Io(e)),
    }
}

/// Convert a PDF page to an image using pdftoppm.
///
/// Uses 300 DPI PNG output for optimal OCR quality.
pub fn pdf_page_to_image(
    pdf_path: &Path,
    page: u32,
    output_dir: &Path,
) -> Result<PathBuf, OcrError> {
    let page_str = page.to_string();
    let output_prefix = output_dir.join("page");

    let status = Command::new("pdftoppm")
        .args(["-png", "-r", "300", "-f", &page_str, "-l", &page_str])
        .arg(pdf_path)
        .arg(&output_prefix)
        .status();

    match status {
        Ok(s) if s.success() => find_page_image(output_dir, page)
            .ok_or_else(|| OcrError::OcrFailed(format!("No image generated for page {}", page))),
        Ok(_) => Err(OcrError::OcrFailed(
            "pdftoppm failed to convert PDF page".to_string(),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::BackendNotAvailable(
            PDFTOPPM_NOT_FOUND.to_string(),
        )),
        Err(e) => Err(OcrError::Io(e)),
    }
}

/// Find the image file for a specific page number.
///
/// pdftoppm names files like page-01.png, page-02.png, etc.
/// The padding width varies based on total page count.
pub fn find_page_image(temp_path: &Path, page_num: u32) -> Option<PathBuf> {
    for digits in [1, 2, 3, 4] {
        let filename = format!("page-{:0width$}.png", page_num, width = digits);
        let path = temp_path.join(&filename);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_page_image_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(find_page_image(temp.path(), 1).is_none());
    }

    #[test]
    fn test_find_page_image_with_2_digit_padding() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("page-03.png"), b"png").unwrap();
        let found = find_page_image(temp.path(), 3).unwrap();
        assert!(found.ends_with("page-03.png"));
    }
}
