use anyhow::Result;

use crate::types::{
    AcceleratorInfo, BackendReasons, BackendSupport, CpuInfo, HardwareProfile, ProbeTimes,
};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux::detect_platform;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos::detect_platform;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use fallback::detect_platform;

#[cfg(target_os = "linux")]
mod level_zero;

pub(crate) mod util;

pub fn detect_now() -> Result<HardwareProfile> {
    let os = std::env::consts::OS.to_string();
    let arch = std::env::consts::ARCH.to_string();

    let cpu = CpuInfo {
        brand: cpu_brand(),
        threads: num_cpus::get() as u32,
    };

    let plat = detect_platform()?;
    for d in &plat.diagnostics {
        tracing::debug!(target: "hwprof", "{d}");
    }

    let backends = BackendSupport {
        cpu: true,
        cuda: plat.cuda,
        rocm: plat.rocm,
        xpu: plat.xpu,
        vulkan: plat.vulkan,
        metal: plat.metal,
    };

    Ok(HardwareProfile {
        schema: 0, // set in cache layer
        os,
        arch,
        cpu,
        accelerators: plat.accelerators,
        backends,
        backend_reasons: plat.backend_reasons,
        fingerprint: String::new(),
        created_at: String::new(),
        updated_at: String::new(),
        probe_ms_total: Some(plat.probe_total_ms),
        probe_times: Some(plat.probe_times),
        diagnostics: if util::hwprof_debug() {
            Some(plat.diagnostics)
        } else {
            None
        },
    })
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn cpu_brand() -> String {
    let cpuid = raw_cpuid::CpuId::new();

    // Prefer full brand string; fall back to vendor
    cpuid
        .get_processor_brand_string()
        .map(|b| b.as_str().trim().to_string())
        .or_else(|| cpuid.get_vendor_info().map(|v| v.as_str().to_string()))
        .unwrap_or_else(|| "Unknown CPU".into())
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn cpu_brand() -> String {
    let sys = sysinfo::System::new_with_specifics(
        sysinfo::RefreshKind::new().with_cpu(sysinfo::CpuRefreshKind::new()),
    );
    sys.cpus()
        .first()
        .map(|c| c.brand().trim().to_string())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| "Unknown CPU".into())
}

/// OS layer returns this and mod.rs assembles the final profile.
pub struct PlatformDetect {
    pub accelerators: Vec<AcceleratorInfo>,
    pub cuda: bool,
    pub rocm: bool,
    pub xpu: bool,
    pub vulkan: bool,
    pub metal: bool,

    pub backend_reasons: BackendReasons,

    pub probe_times: ProbeTimes,
    pub probe_total_ms: u64,
    pub diagnostics: Vec<String>,
}
