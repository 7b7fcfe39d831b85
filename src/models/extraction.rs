//! Structured result of the document extraction pipeline.

use serde::{Deserialize, Serialize};

use super::lead::{LeadSource, LeadStatus};

/// Result of running OCR extraction over an uploaded document.
///
/// Every field slot is always populated: unresolved fields carry a
/// well-known sentinel, never an empty string. `error` is set only on hard
/// failure, `fallback` only when degraded extraction replaced the full
/// pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadExtraction {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub source: LeadSource,
    /// Truncated preview of the aggregated OCR output, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    /// Fraction of the three contact fields that were resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Which backend produced the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

impl LeadExtraction {
    /// Whether the extraction hard-failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let extraction = LeadExtraction {
            name: "John Smith".to_string(),
            email: "john@example.com".to_string(),
            phone: "555-123-4567".to_string(),
            status: LeadStatus::New,
            source: LeadSource::Document,
            raw_text: None,
            confidence: Some(1.0),
            backend: Some("tesseract".to_string()),
            extraction_notes: None,
            error: None,
            fallback: None,
        };
        let json = serde_json::to_string(&extraction).unwrap();
        assert!(!json.contains("error"));
        assert!(!json.contains("fallback"));
        assert!(json.contains("confidence"));
    }
}
