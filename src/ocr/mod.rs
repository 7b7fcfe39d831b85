//! OCR and document information extraction.
//!
//! Turns uploaded documents (images and multi-page PDFs) into structured
//! lead contact fields:
//!
//! - Tesseract for classic OCR (default, CPU-based)
//! - A vision-language model backend for prompt-constrained extraction
//!   (GPU optional, selected by the engine profile)
//! - Pattern heuristics that parse name/email/phone out of the raw text
//!
//! The orchestrator in [`pipeline`] is the only entry point callers need;
//! it never raises past its boundary.

mod backend;
mod engine;
mod model_utils;
mod parse;
mod pdf_utils;
mod pipeline;
mod preprocess;
mod tesseract;
mod vision;

pub use backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};
pub use engine::{engine_profile, EngineProfile};
pub use parse::{
    extract_email, extract_name, extract_phone, EMAIL_NOT_FOUND, NAME_NOT_FOUND, PHONE_NOT_FOUND,
};
pub use pipeline::LeadExtractor;
pub use tesseract::TesseractBackend;
pub use vision::VisionBackend;
