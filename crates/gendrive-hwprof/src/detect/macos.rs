use super::PlatformDetect;
use crate::detect::util;
use crate::types::{AcceleratorInfo, BackendReasons, ProbeTimes};
use anyhow::Result;
use gendrive_abi::DeviceKind;
use std::time::Instant;

pub fn detect_platform() -> Result<PlatformDetect> {
    let mut reasons = BackendReasons::default();
    let mut times = ProbeTimes::default();
    let mut diags: Vec<String> = Vec::new();

    let start = Instant::now();
    let accelerators = if util::disabled("metal") {
        diags.push("[metal] disabled by env".into());
        reasons.metal = Some("disabled_env".into());
        Vec::new()
    } else {
        enumerate_metal_devices()
    };
    let ms = start.elapsed().as_millis() as u64;
    times.metal_ms = Some(ms);

    let metal_ok = !accelerators.is_empty();
    if !metal_ok && reasons.metal.is_none() {
        reasons.metal = Some("no_device".into());
    }
    reasons.cuda = Some("unsupported_os".into());
    reasons.rocm = Some("unsupported_os".into());
    reasons.xpu = Some("unsupported_os".into());

    Ok(PlatformDetect {
        accelerators,
        cuda: false,
        rocm: false,
        xpu: false,
        vulkan: false,
        metal: metal_ok,

        backend_reasons: reasons,
        probe_times: times,
        probe_total_ms: ms,
        diagnostics: diags,
    })
}

fn enumerate_metal_devices() -> Vec<AcceleratorInfo> {
    metal::Device::all()
        .into_iter()
        .enumerate()
        .map(|(ordinal, d)| AcceleratorInfo {
            kind: DeviceKind::Metal,
            ordinal: ordinal as u32,
            vendor_id: 0x106B,
            device_id: 0,
            vendor: "Apple".to_string(),
            name: d.name().to_string(),
            driver_version: None,
            vram_bytes: Some(d.recommended_max_working_set_size()),
            integrated: d.is_low_power() || d.has_unified_memory(),
            software_renderer: false,
            software_reason: None,
        })
        .collect()
}
