//! leadflow - lead management backend with OCR document extraction.
//!
//! Accepts leads manually or via document upload, extracts contact fields
//! (name, email, phone) from scanned documents, stores leads and automation
//! workflows in flat files, and runs simple rule-based workflows on
//! lead-creation events.

pub mod cli;
pub mod config;
pub mod models;
pub mod ocr;
pub mod server;
pub mod storage;
pub mod workflow;
