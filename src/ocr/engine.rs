//! Compute profile selection for the vision backend.
//!
//! The profile (device + numeric precision) is resolved lazily exactly once
//! per process and cached for all subsequent calls. GPU execution is only
//! committed when the reported memory clears a minimum threshold; anything
//! less silently degrades to CPU rather than failing the request.

use std::process::Command;
use std::sync::OnceLock;

use tracing::{info, warn};

/// Global cached engine profile (resolved once, reused for all OCR calls).
static ENGINE_PROFILE: OnceLock<EngineProfile> = OnceLock::new();

/// Resolved compute configuration for model inference.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineProfile {
    /// Device argument for the model CLI ("cuda" or "cpu").
    pub device: &'static str,
    /// Numeric precision ("f16" on GPU for throughput, "f32" on CPU).
    pub dtype: &'static str,
    /// Whether accelerated execution was committed.
    pub gpu: bool,
    /// Total GPU memory in GB, when an accelerator was detected.
    pub gpu_memory_gb: Option<f32>,
}

impl EngineProfile {
    fn cpu(gpu_memory_gb: Option<f32>) -> Self {
        Self {
            device: "cpu",
            dtype: "f32",
            gpu: false,
            gpu_memory_gb,
        }
    }

    fn cuda(gpu_memory_gb: f32) -> Self {
        Self {
            device: "cuda",
            dtype: "f16",
            gpu: true,
            gpu_memory_gb: Some(gpu_memory_gb),
        }
    }
}

/// Get the cached engine profile, probing the host on first use.
///
/// Concurrent first callers race on the probe; `OnceLock` guarantees a
/// single profile is ever published.
pub fn engine_profile(min_gpu_memory_gb: f32) -> &'static EngineProfile {
    ENGINE_PROFILE.get_or_init(|| {
        let profile = select_profile(probe_gpu_memory_gb(), min_gpu_memory_gb);
        info!(
            device = profile.device,
            dtype = profile.dtype,
            "OCR engine profile resolved"
        );
        profile
    })
}

/// Pick a profile from the probed GPU memory and the configured threshold.
fn select_profile(gpu_memory_gb: Option<f32>, min_gpu_memory_gb: f32) -> EngineProfile {
    match gpu_memory_gb {
        Some(memory) if memory >= min_gpu_memory_gb => EngineProfile::cuda(memory),
        Some(memory) => {
            warn!(
                "GPU memory ({:.1}GB) below {:.1}GB threshold, using CPU",
                memory, min_gpu_memory_gb
            );
            EngineProfile::cpu(Some(memory))
        }
        None => EngineProfile::cpu(None),
    }
}

/// Query total GPU memory via nvidia-smi. Returns None when no accelerator
/// is present or the query fails.
fn probe_gpu_memory_gb() -> Option<f32> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=memory.total", "--format=csv,noheader,nounits"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_smi_memory(&String::from_utf8_lossy(&output.stdout))
}

/// Parse nvidia-smi memory output (MiB, one line per device) into GB for
/// the first device.
fn parse_smi_memory(output: &str) -> Option<f32> {
    let mib: f32 = output.lines().next()?.trim().parse().ok()?;
    Some(mib / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_profile_commits_gpu_above_threshold() {
        let profile = select_profile(Some(8.0), 6.0);
        assert!(profile.gpu);
        assert_eq!(profile.device, "cuda");
        assert_eq!(profile.dtype, "f16");
    }

    #[test]
    fn test_select_profile_degrades_below_threshold() {
        // Accelerator present but short on memory: degrade, never fail.
        let profile = select_profile(Some(4.0), 6.0);
        assert!(!profile.gpu);
        assert_eq!(profile.device, "cpu");
        assert_eq!(profile.dtype, "f32");
        assert_eq!(profile.gpu_memory_gb, Some(4.0));
    }

    #[test]
    fn test_select_profile_no_accelerator() {
        let profile = select_profile(None, 6.0);
        assert!(!profile.gpu);
        assert_eq!(profile.gpu_memory_gb, None);
    }

    #[test]
    fn test_parse_smi_memory() {
        assert_eq!(parse_smi_memory("8192\n"), Some(8.0));
        assert_eq!(parse_smi_memory("8192\n4096\n"), Some(8.0));
        assert_eq!(parse_smi_memory("garbage"), None);
        assert_eq!(parse_smi_memory(""), None);
    }
}
