//! Vision-language model backend implementation.
//!
//! Drives the deepseek-ocr CLI for model-based contact extraction: each
//! image (or rasterized PDF page) is normalized, handed to the model with a
//! fixed contact-extraction prompt, and decoded with a bounded token budget.
//! Generation runs on a worker thread raced against a wall-clock timer; on
//! expiry the worker's result is abandoned and the call reports a timeout.
//!
//! Install deepseek-ocr.rs from:
//! https://github.com/TimmyOVO/deepseek-ocr.rs

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tracing::debug;

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};
use super::engine::{engine_profile, EngineProfile};
use super::model_utils::{check_binary, spool_upload};
use super::pdf_utils::{pdf_page_count, pdf_page_to_image};
use super::preprocess::prepare_image;

/// Fixed instruction prompt. The model is asked for the three contact
/// fields only, in a constrained single-line format.
const EXTRACTION_PROMPT: &str = "Extract contact information from this document. \
Focus only on:\n- Name\n- Email\n- Phone\n\n\
Format: Name: [name], Email: [email], Phone: [phone] <image>";

/// Vision-language model OCR backend using the deepseek-ocr CLI.
pub struct VisionBackend {
    config: OcrConfig,
    /// Path to the deepseek-ocr binary.
    binary_path: PathBuf,
}

impl VisionBackend {
    /// Create a new vision backend with default configuration.
    pub fn new() -> Self {
        Self::with_config(OcrConfig::default())
    }

    /// Create a new vision backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self {
            config,
            binary_path: PathBuf::from("deepseek-ocr-cli"),
        }
    }

    /// Set the path to the deepseek-ocr binary.
    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    fn is_binary_available(&self) -> bool {
        check_binary(self.binary_path.to_str().unwrap_or("deepseek-ocr-cli"))
            || self.binary_path.exists()
    }

    /// Normalize an image and run one generation pass over it.
    fn infer_image(&self, image_bytes: &[u8], work_dir: &Path) -> Result<String, OcrError> {
        let prepared = prepare_image(image_bytes)?;
        let input_path = work_dir.join("model-input.png");
        std::fs::write(&input_path, prepared).map_err(OcrError::Io)?;
        self.run_generation(&input_path)
    }

    /// Run a single constrained generation pass, bounded by the configured
    /// wall-clock budget.
    fn run_generation(&self, image_path: &Path) -> Result<String, OcrError> {
        let profile = engine_profile(self.config.min_gpu_memory_gb);
        let budget = Duration::from_secs(self.config.generation_timeout_secs);
        let command = self.build_command(image_path, profile);

        debug!(
            device = profile.device,
            budget_secs = self.config.generation_timeout_secs,
            "Starting generation pass"
        );
        run_with_budget(budget, move || exec_generation(command))
    }

    fn build_command(&self, image_path: &Path, profile: &EngineProfile) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("--quiet") // suppress logs, output only the decoded tokens
            .args(["--prompt", EXTRACTION_PROMPT])
            .args(["--image", &image_path.to_string_lossy()])
            .args(["--device", profile.device])
            .args(["--dtype", profile.dtype])
            .args(["--model", &self.config.model])
            .args(["--max-new-tokens", &self.config.max_new_tokens.to_string()]);
        command
    }

    /// Run inference over every page of a PDF, labeling output per page.
    ///
    /// A generation timeout on any page is fatal for the whole call; the
    /// orchestrator maps it to the fallback path.
    fn extract_pdf(&self, pdf_path: &Path, work_dir: &Path) -> Result<String, OcrError> {
        let page_count = pdf_page_count(pdf_path)?;
        let mut all_text = String::new();

        for page in 1..=page_count {
            debug!("Processing PDF page {}/{}", page, page_count);
            let image_path = pdf_page_to_image(pdf_path, page, work_dir)?;
            let image_bytes = std::fs::read(&image_path).map_err(OcrError::Io)?;
            let text = self.infer_image(&image_bytes, work_dir)?;
            all_text.push_str(&format_page(page, &text));
        }
        Ok(all_text)
    }
}

/// Label one page of model output with its page number.
fn format_page(page: u32, text: &str) -> String {
    format!("Page {}: {}\n", page, text.trim())
}

impl Default for VisionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for VisionBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Vision
    }

    fn is_available(&self) -> bool {
        self.is_binary_available()
    }

    fn availability_hint(&self) -> String {
        if !self.is_binary_available() {
            format!(
                "deepseek-ocr not found at '{}'. Install from: \
                 https://github.com/TimmyOVO/deepseek-ocr.rs",
                self.binary_path.display()
            )
        } else if !check_binary("pdftoppm") {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            let profile = engine_profile(self.config.min_gpu_memory_gb);
            format!(
                "Vision backend is available (device: {}, model: {})",
                profile.device, self.config.model
            )
        }
    }

    fn extract_text(&self, content: &[u8], filename: &str) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;

        if filename.to_lowercase().ends_with(".pdf") {
            let pdf_path = spool_upload(content, filename, temp_dir.path())?;
            self.extract_pdf(&pdf_path, temp_dir.path())
        } else {
            self.infer_image(content, temp_dir.path())
        }
    }
}

/// Execute the model CLI and collect its decoded output.
fn exec_generation(mut command: Command) -> Result<String, OcrError> {
    let output = command.output();
    match output {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!(
                    "deepseek-ocr failed: {}",
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(OcrError::BackendNotAvailable(
            "deepseek-ocr not found. Install from: https://github.com/TimmyOVO/deepseek-ocr.rs"
                .to_string(),
        )),
        Err(e) => Err(OcrError::Io(e)),
    }
}

/// Race a blocking task against a wall-clock budget.
///
/// The task runs on its own thread; on expiry its eventual result is
/// abandoned rather than the thread being killed, so shared state is never
/// left mid-mutation.
fn run_with_budget<T, F>(budget: Duration, task: F) -> Result<T, OcrError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, OcrError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(task());
    });

    match rx.recv_timeout(budget) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(OcrError::Timeout {
            budget_secs: budget.as_secs(),
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(OcrError::OcrFailed(
            "generation worker exited without a result".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_page_labels_are_ordered() {
        let mut all_text = String::new();
        for page in 1..=3 {
            all_text.push_str(&format_page(page, "Name: A, Email: a@b.co, Phone: 555"));
        }
        let positions: Vec<usize> = (1..=3)
            .map(|page| all_text.find(&format!("Page {}:", page)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_run_with_budget_returns_in_time() {
        let result = run_with_budget(Duration::from_secs(5), || Ok("fast".to_string()));
        assert_eq!(result.unwrap(), "fast");
    }

    #[test]
    fn test_run_with_budget_times_out_within_bounds() {
        let start = Instant::now();
        let result = run_with_budget(Duration::from_millis(50), || {
            thread::sleep(Duration::from_secs(5));
            Ok("too late".to_string())
        });
        assert!(matches!(result, Err(OcrError::Timeout { .. })));
        // Budget plus bounded overhead, far below the worker's sleep.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_run_with_budget_propagates_task_error() {
        let result: Result<String, _> = run_with_budget(Duration::from_secs(5), || {
            Err(OcrError::OcrFailed("boom".to_string()))
        });
        assert!(matches!(result, Err(OcrError::OcrFailed(_))));
    }
}
