//! Extraction orchestrator.
//!
//! Public entry point of the OCR pipeline: dispatches a raw upload to the
//! configured backend, parses contact fields out of the aggregated text,
//! scores confidence, and degrades to a structured fallback on timeout.
//! Every failure branch terminates here; callers always receive a
//! well-formed [`LeadExtraction`], never an error.

use tracing::{debug, error, warn};

use crate::models::{LeadExtraction, LeadSource, LeadStatus};

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};
use super::parse::{
    extract_email, extract_name, extract_phone, EMAIL_NOT_FOUND, NAME_NOT_FOUND, PHONE_NOT_FOUND,
};
use super::tesseract::TesseractBackend;
use super::vision::VisionBackend;

/// Maximum characters of raw OCR output kept in the result preview.
const RAW_TEXT_PREVIEW_CHARS: usize = 500;

/// Sentinels used when extraction hard-fails.
const NAME_ERROR: &str = "OCR Error";
const EMAIL_ERROR: &str = "error@ocr.failed";
const PHONE_ERROR: &str = "OCR Error";

/// Sentinels used on the degraded fallback path.
const MANUAL_ENTRY: &str = "Manual Entry Required";
const MANUAL_ENTRY_EMAIL: &str = "manual@entry.required";

/// Document extraction pipeline.
///
/// Cheap to construct; the expensive engine state lives in the
/// process-wide cache and is shared across all extractors.
pub struct LeadExtractor {
    config: OcrConfig,
}

impl LeadExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Backend selected by static configuration.
    pub fn backend(&self) -> Box<dyn OcrBackend> {
        match OcrBackendType::from_str(&self.config.backend) {
            Some(OcrBackendType::Vision) => {
                Box::new(VisionBackend::with_config(self.config.clone()))
            }
            Some(OcrBackendType::Tesseract) => {
                Box::new(TesseractBackend::with_config(self.config.clone()))
            }
            None => {
                warn!(
                    "Unknown OCR backend '{}', using tesseract",
                    self.config.backend
                );
                Box::new(TesseractBackend::with_config(self.config.clone()))
            }
        }
    }

    /// Run the full pipeline over an uploaded document.
    pub fn extract(&self, content: &[u8], filename: &str) -> LeadExtraction {
        self.extract_with(self.backend().as_ref(), content, filename)
    }

    /// Run the pipeline with a specific backend.
    pub fn extract_with(
        &self,
        backend: &dyn OcrBackend,
        content: &[u8],
        filename: &str,
    ) -> LeadExtraction {
        log_content_mismatch(content, filename);

        match backend.extract_text(content, filename) {
            Ok(text) => {
                debug!(
                    backend = %backend.backend_type(),
                    chars = text.len(),
                    "OCR text extracted"
                );
                assemble_result(&text, backend.backend_type())
            }
            Err(OcrError::Timeout { budget_secs }) => {
                warn!(
                    backend = %backend.backend_type(),
                    budget_secs,
                    "OCR generation timed out, falling back to manual entry"
                );
                fallback_result(backend.backend_type(), budget_secs)
            }
            Err(e) => {
                error!(backend = %backend.backend_type(), "OCR extraction failed: {}", e);
                error_result(backend.backend_type(), &e)
            }
        }
    }
}

/// Parse fields out of extracted text and score the result.
fn assemble_result(text: &str, backend: OcrBackendType) -> LeadExtraction {
    let email = extract_email(text);
    let name = extract_name(text);
    let phone = extract_phone(text);

    let mut missing = Vec::new();
    if name.is_none() {
        warn!("No name found in document");
        missing.push("name");
    }
    if email.is_none() {
        warn!("No email found in document");
        missing.push("email");
    }
    if phone.is_none() {
        warn!("No phone found in document");
        missing.push("phone");
    }

    let found = 3 - missing.len();
    let chars = text.chars().count();
    let notes = if missing.is_empty() {
        format!("raw text: {} chars; all fields found", chars)
    } else {
        format!(
            "raw text: {} chars; missing fields: {}",
            chars,
            missing.join(", ")
        )
    };

    LeadExtraction {
        name: name.unwrap_or_else(|| NAME_NOT_FOUND.to_string()),
        email: email.unwrap_or_else(|| EMAIL_NOT_FOUND.to_string()),
        phone: phone.unwrap_or_else(|| PHONE_NOT_FOUND.to_string()),
        status: LeadStatus::New,
        source: LeadSource::Document,
        raw_text: Some(truncate_preview(text)),
        confidence: Some(found as f32 / 3.0),
        backend: Some(backend.as_str().to_string()),
        extraction_notes: Some(notes),
        error: None,
        fallback: None,
    }
}

/// Result for a hard backend failure.
fn error_result(backend: OcrBackendType, cause: &OcrError) -> LeadExtraction {
    LeadExtraction {
        name: NAME_ERROR.to_string(),
        email: EMAIL_ERROR.to_string(),
        phone: PHONE_ERROR.to_string(),
        status: LeadStatus::New,
        source: LeadSource::Document,
        raw_text: None,
        confidence: Some(0.0),
        backend: Some(backend.as_str().to_string()),
        extraction_notes: None,
        error: Some(cause.to_string()),
        fallback: None,
    }
}

/// Degraded result for a generation timeout. Never an error: the caller is
/// asked to enter the contact details manually.
fn fallback_result(backend: OcrBackendType, budget_secs: u64) -> LeadExtraction {
    LeadExtraction {
        name: MANUAL_ENTRY.to_string(),
        email: MANUAL_ENTRY_EMAIL.to_string(),
        phone: MANUAL_ENTRY.to_string(),
        status: LeadStatus::New,
        source: LeadSource::Document,
        raw_text: None,
        confidence: Some(0.0),
        backend: Some(backend.as_str().to_string()),
        extraction_notes: Some(format!(
            "OCR did not complete within {}s; please enter the contact details manually",
            budget_secs
        )),
        error: None,
        fallback: Some(true),
    }
}

/// Truncate raw OCR output to a bounded preview, on a char boundary.
fn truncate_preview(text: &str) -> String {
    text.chars().take(RAW_TEXT_PREVIEW_CHARS).collect()
}

/// Warn when the upload's content does not look like its extension claims.
/// Purely diagnostic; the backend is the authority on decodability.
fn log_content_mismatch(content: &[u8], filename: &str) {
    let claimed = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match infer::get(content) {
        Some(kind) if kind.extension() != claimed && !(claimed == "jpeg" && kind.extension() == "jpg") => {
            warn!(
                "Upload '{}' has {} content, extension says .{}",
                filename,
                kind.extension(),
                claimed
            );
        }
        Some(_) => {}
        None => debug!("Upload '{}' content type not recognized", filename),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::backend::OcrBackend;

    /// Backend stub returning a canned outcome.
    struct StubBackend {
        outcome: fn() -> Result<String, OcrError>,
    }

    impl OcrBackend for StubBackend {
        fn backend_type(&self) -> OcrBackendType {
            OcrBackendType::Tesseract
        }
        fn is_available(&self) -> bool {
            true
        }
        fn availability_hint(&self) -> String {
            "stub".to_string()
        }
        fn extract_text(&self, _content: &[u8], _filename: &str) -> Result<String, OcrError> {
            (self.outcome)()
        }
    }

    fn extractor() -> LeadExtractor {
        LeadExtractor::new(OcrConfig::default())
    }

    fn run_stub(outcome: fn() -> Result<String, OcrError>) -> LeadExtraction {
        extractor().extract_with(&StubBackend { outcome }, b"bytes", "card.png")
    }

    #[test]
    fn test_full_extraction_scores_one() {
        let result = run_stub(|| Ok("John Smith\njohn.smith@example.com\n(555) 123-4567".into()));
        assert_eq!(result.name, "John Smith");
        assert_eq!(result.email, "john.smith@example.com");
        assert_eq!(result.phone, "(555) 123-4567");
        assert_eq!(result.confidence, Some(1.0));
        assert!(result.error.is_none());
        assert!(result.fallback.is_none());
        assert!(result
            .extraction_notes
            .as_deref()
            .unwrap()
            .contains("all fields found"));
    }

    #[test]
    fn test_nothing_found_still_succeeds() {
        let result = run_stub(|| Ok("   \n\n".into()));
        assert_eq!(result.name, NAME_NOT_FOUND);
        assert_eq!(result.email, EMAIL_NOT_FOUND);
        assert_eq!(result.phone, PHONE_NOT_FOUND);
        assert_eq!(result.confidence, Some(0.0));
        assert!(result.error.is_none());
        assert!(result
            .extraction_notes
            .as_deref()
            .unwrap()
            .contains("missing fields: name, email, phone"));
    }

    #[test]
    fn test_partial_extraction_scores_fraction() {
        let result = run_stub(|| Ok("Jane Doe\njane@example.com".into()));
        assert_eq!(result.name, "Jane Doe");
        assert_eq!(result.phone, PHONE_NOT_FOUND);
        let confidence = result.confidence.unwrap();
        assert!((confidence - 2.0 / 3.0).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn test_hard_failure_produces_error_result() {
        let result = run_stub(|| Err(OcrError::OcrFailed("decode exploded".into())));
        assert_eq!(result.name, NAME_ERROR);
        assert_eq!(result.email, EMAIL_ERROR);
        assert_eq!(result.confidence, Some(0.0));
        assert!(result.error.as_deref().unwrap().contains("decode exploded"));
        assert!(result.fallback.is_none());
    }

    #[test]
    fn test_timeout_produces_fallback_result() {
        let result = run_stub(|| Err(OcrError::Timeout { budget_secs: 30 }));
        assert_eq!(result.fallback, Some(true));
        assert_eq!(result.name, MANUAL_ENTRY);
        assert_eq!(result.confidence, Some(0.0));
        assert!(result.error.is_none());
        assert!(result
            .extraction_notes
            .as_deref()
            .unwrap()
            .contains("manually"));
    }

    #[test]
    fn test_raw_text_preview_is_capped() {
        let result = run_stub(|| Ok("x".repeat(5000)));
        assert_eq!(result.raw_text.as_deref().unwrap().len(), 500);
    }

    #[test]
    fn test_unknown_backend_name_falls_back_to_tesseract() {
        let extractor = LeadExtractor::new(OcrConfig {
            backend: "olmocr".to_string(),
            ..OcrConfig::default()
        });
        assert_eq!(extractor.backend().backend_type(), OcrBackendType::Tesseract);
    }
}
