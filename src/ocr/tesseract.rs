//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract via command-line for text extraction. This is the
//! traditional, widely-available OCR option: CPU-only, fast, deterministic.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use tracing::debug;

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};
use super::model_utils::{check_binary, spool_upload};
use super::pdf_utils::{pdf_page_count, pdf_page_to_image};

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Run Tesseract on an image file.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!(
                        "tesseract failed: {}",
                        stderr.trim()
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }

    /// Rasterize and recognize every page of a PDF, joined with ordered
    /// page separators.
    fn extract_pdf(&self, pdf_path: &Path, work_dir: &Path) -> Result<String, OcrError> {
        let page_count = pdf_page_count(pdf_path)?;
        debug!("Running tesseract over {} PDF pages", page_count);

        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            let image_path = pdf_page_to_image(pdf_path, page, work_dir)?;
            let text = self.run_tesseract(&image_path)?;
            pages.push(format_page(page, &text));
        }
        Ok(pages.join("\n"))
    }
}

/// Label one page of recognized text with its ordered page separator.
fn format_page(page: u32, text: &str) -> String {
    format!("--- Page {} ---\n{}", page, text.trim_end())
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for TesseractBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Tesseract
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else if !check_binary("pdftoppm") {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn extract_text(&self, content: &[u8], filename: &str) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;
        let upload_path = spool_upload(content, filename, temp_dir.path())?;

        if filename.to_lowercase().ends_with(".pdf") {
            self.extract_pdf(&upload_path, temp_dir.path())
        } else {
            self.run_tesseract(&upload_path)
        }
    }
}
