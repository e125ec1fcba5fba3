use super::PlatformDetect;
use crate::types::{BackendReasons, ProbeTimes};
use anyhow::Result;

/// No accelerator probes on this OS yet; only the CPU is reported.
pub fn detect_platform() -> Result<PlatformDetect> {
    let unsupported = || Some("unsupported_os".to_string());
    Ok(PlatformDetect {
        accelerators: Vec::new(),
        cuda: false,
        rocm: false,
        xpu: false,
        vulkan: false,
        metal: false,

        backend_reasons: BackendReasons {
            cuda: unsupported(),
            rocm: unsupported(),
            xpu: unsupported(),
            vulkan: unsupported(),
            metal: unsupported(),
        },
        probe_times: ProbeTimes::default(),
        probe_total_ms: 0,
        diagnostics: vec![format!("[hwprof] no probes for {}", std::env::consts::OS)],
    })
}
