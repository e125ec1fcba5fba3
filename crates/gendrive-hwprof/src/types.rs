use gendrive_abi::DeviceKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub schema: u32,

    pub os: String,
    pub arch: String,

    pub cpu: CpuInfo,

    pub accelerators: Vec<AcceleratorInfo>,
    pub backends: BackendSupport,

    #[serde(default)]
    pub backend_reasons: BackendReasons, // why a backend is false

    pub fingerprint: String,
    pub created_at: String,
    pub updated_at: String,

    // Diagnostics/telemetry (optional)
    #[serde(default)]
    pub probe_ms_total: Option<u64>,
    #[serde(default)]
    pub probe_times: Option<ProbeTimes>,
    #[serde(default)]
    pub diagnostics: Option<Vec<String>>,
}

impl HardwareProfile {
    /// Accelerators of `kind` usable for compute, in ordinal order.
    pub fn usable(&self, kind: DeviceKind) -> impl Iterator<Item = &AcceleratorInfo> {
        self.accelerators
            .iter()
            .filter(move |a| a.kind == kind && !a.software_renderer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuInfo {
    pub brand: String,
    pub threads: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratorInfo {
    pub kind: DeviceKind,
    /// Index within `kind`, as the backend runtime numbers it (`xpu:1` → 1).
    pub ordinal: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub vendor: String,
    pub name: String,

    #[serde(default)]
    pub driver_version: Option<String>,
    #[serde(default)]
    pub vram_bytes: Option<u64>,
    #[serde(default)]
    pub integrated: bool,
    #[serde(default)]
    pub software_renderer: bool, // llvmpipe/SwiftShader/etc
    #[serde(default)]
    pub software_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSupport {
    pub cpu: bool,
    pub cuda: bool,
    pub rocm: bool,
    pub xpu: bool,
    pub vulkan: bool,
    pub metal: bool,
}

impl BackendSupport {
    pub fn get(&self, kind: DeviceKind) -> bool {
        match kind {
            DeviceKind::Cpu => self.cpu,
            DeviceKind::Cuda => self.cuda,
            DeviceKind::Rocm => self.rocm,
            DeviceKind::Xpu => self.xpu,
            DeviceKind::Vulkan => self.vulkan,
            DeviceKind::Metal => self.metal,
        }
    }
}

/// Why a backend isn't available (timeout/no_device/software_renderer/disabled_env).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendReasons {
    #[serde(default)]
    pub cuda: Option<String>,
    #[serde(default)]
    pub rocm: Option<String>,
    #[serde(default)]
    pub xpu: Option<String>,
    #[serde(default)]
    pub vulkan: Option<String>,
    #[serde(default)]
    pub metal: Option<String>,
}

impl BackendReasons {
    pub fn get(&self, kind: DeviceKind) -> Option<&str> {
        match kind {
            DeviceKind::Cpu => None,
            DeviceKind::Cuda => self.cuda.as_deref(),
            DeviceKind::Rocm => self.rocm.as_deref(),
            DeviceKind::Xpu => self.xpu.as_deref(),
            DeviceKind::Vulkan => self.vulkan.as_deref(),
            DeviceKind::Metal => self.metal.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProbeTimes {
    #[serde(default)]
    pub cuda_ms: Option<u64>,
    #[serde(default)]
    pub rocm_ms: Option<u64>,
    #[serde(default)]
    pub level_zero_ms: Option<u64>,
    #[serde(default)]
    pub vulkan_ms: Option<u64>,
    #[serde(default)]
    pub metal_ms: Option<u64>,
}
