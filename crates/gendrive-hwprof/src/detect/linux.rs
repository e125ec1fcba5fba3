#![allow(non_snake_case)]

use anyhow::{Context, Result, anyhow};
use ash::{Entry, vk};
use core::ffi::c_char;
use gendrive_abi::DeviceKind;
use libloading::{Library, Symbol};
use std::ffi::{CStr, CString};
use std::time::Duration;

use super::PlatformDetect;
use super::level_zero::enumerate_xpus;
use crate::detect::util;
use crate::types::{AcceleratorInfo, BackendReasons, ProbeTimes};

const VENDOR_NVIDIA: u32 = 0x10DE;
const VENDOR_AMD: u32 = 0x1002;
const VENDOR_INTEL: u32 = 0x8086;

fn vendor_name(id: u32) -> &'static str {
    match id {
        VENDOR_NVIDIA => "NVIDIA",
        VENDOR_AMD => "AMD",
        VENDOR_INTEL => "Intel",
        _ => "Unknown",
    }
}

/// Outcome of one probe: devices found, or the reason there are none.
type Probe = (Vec<AcceleratorInfo>, Option<String>, u64);

fn run_probe<F>(label: &'static str, to: Duration, diags: &mut Vec<String>, f: F) -> Probe
where
    F: FnOnce() -> Result<Vec<AcceleratorInfo>> + Send + 'static,
{
    if util::disabled(label) {
        diags.push(format!("[{label}] disabled by env"));
        return (Vec::new(), Some("disabled_env".into()), 0);
    }
    let (out, reason, ms) = util::with_timeout(label, to, f);
    match out {
        Some(Ok(devs)) if devs.is_empty() => (devs, Some("no_device".into()), ms),
        Some(Ok(devs)) => {
            diags.push(format!("[{label}] {} device(s) in {ms} ms", devs.len()));
            (devs, None, ms)
        }
        Some(Err(e)) => {
            diags.push(format!("[{label}] error: {e:#}"));
            (Vec::new(), Some(format!("probe_error:{e}")), ms)
        }
        None => {
            diags.push(format!("[{label}] timeout after {ms} ms"));
            (Vec::new(), reason, ms)
        }
    }
}

pub fn detect_platform() -> Result<PlatformDetect> {
    let mut reasons = BackendReasons::default();
    let mut diags: Vec<String> = Vec::new();
    let mut times = ProbeTimes::default();

    let to = Duration::from_millis(util::env_timeout_ms());

    let (xpus, xpu_reason, ze_ms) = run_probe("xpu", to, &mut diags, enumerate_xpus);
    times.level_zero_ms = Some(ze_ms);
    reasons.xpu = xpu_reason;

    let (cudas, cuda_reason, cu_ms) = run_probe("cuda", to, &mut diags, enumerate_cuda);
    times.cuda_ms = Some(cu_ms);
    reasons.cuda = cuda_reason;

    let (rocms, rocm_reason, rc_ms) = run_probe("rocm", to, &mut diags, enumerate_rocm);
    times.rocm_ms = Some(rc_ms);
    reasons.rocm = rocm_reason;

    let (vks, mut vk_reason, vk_ms) = run_probe("vulkan", to, &mut diags, enumerate_vulkan);
    times.vulkan_ms = Some(vk_ms);
    let vulkan_ok = vks.iter().any(|g| !g.software_renderer);
    if !vulkan_ok && vk_reason.is_none() {
        vk_reason = Some("software_renderer".into());
    }
    reasons.vulkan = vk_reason;

    let total_ms = ze_ms + cu_ms + rc_ms + vk_ms;

    let xpu_ok = !xpus.is_empty();
    let cuda_ok = !cudas.is_empty();
    let rocm_ok = !rocms.is_empty();

    let mut accelerators = xpus;
    accelerators.extend(cudas);
    accelerators.extend(rocms);
    accelerators.extend(vks);

    Ok(PlatformDetect {
        accelerators,
        cuda: cuda_ok,
        rocm: rocm_ok,
        xpu: xpu_ok,
        vulkan: vulkan_ok,
        metal: false,

        backend_reasons: reasons,
        probe_times: times,
        probe_total_ms: total_ms,
        diagnostics: diags,
    })
}

// --- CUDA (driver API, dlopen) ---
type CuInit = unsafe extern "C" fn(u32) -> i32;
type CuDevCnt = unsafe extern "C" fn(*mut i32) -> i32;
type CuDevGet = unsafe extern "C" fn(*mut i32, i32) -> i32;
type CuDevName = unsafe extern "C" fn(*mut c_char, i32, i32) -> i32;
type CuDevTotalMem = unsafe extern "C" fn(*mut usize, i32) -> i32;
type CuDrvVer = unsafe extern "C" fn(*mut i32) -> i32;

fn enumerate_cuda() -> Result<Vec<AcceleratorInfo>> {
    const CANDIDATES: &[&str] = &["libcuda.so.1", "libcuda.so"];
    let lib = CANDIDATES
        .iter()
        .find_map(|name| unsafe { Library::new(name) }.ok())
        .ok_or_else(|| anyhow!("no_driver"))?;

    unsafe {
        let cuInit: Symbol<CuInit> = lib.get(b"cuInit").context("get cuInit")?;
        let cuDeviceGetCount: Symbol<CuDevCnt> = lib
            .get(b"cuDeviceGetCount")
            .context("get cuDeviceGetCount")?;
        let cuDeviceGet: Symbol<CuDevGet> = lib.get(b"cuDeviceGet").context("get cuDeviceGet")?;
        let cuDeviceGetName: Symbol<CuDevName> = lib
            .get(b"cuDeviceGetName")
            .context("get cuDeviceGetName")?;
        let cuDeviceTotalMem: Symbol<CuDevTotalMem> = lib
            .get(b"cuDeviceTotalMem_v2")
            .context("get cuDeviceTotalMem_v2")?;
        let cuDriverGetVersion: Symbol<CuDrvVer> = lib
            .get(b"cuDriverGetVersion")
            .context("get cuDriverGetVersion")?;

        if cuInit(0) != 0 {
            return Err(anyhow!("cuInit failed"));
        }
        let mut cnt = 0i32;
        if cuDeviceGetCount(&mut cnt) != 0 {
            return Err(anyhow!("cuDeviceGetCount failed"));
        }
        let mut ver = 0i32;
        let _ = cuDriverGetVersion(&mut ver);
        let driver_version = util::packed_version_string(ver);

        let mut out = Vec::with_capacity(cnt.max(0) as usize);
        for ordinal in 0..cnt {
            let mut dev = 0i32;
            if cuDeviceGet(&mut dev, ordinal) != 0 {
                continue;
            }
            let mut buf = [0 as c_char; 256];
            let name = if cuDeviceGetName(buf.as_mut_ptr(), buf.len() as i32, dev) == 0 {
                CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
            } else {
                format!("CUDA device {ordinal}")
            };
            let mut mem = 0usize;
            let vram_bytes = (cuDeviceTotalMem(&mut mem, dev) == 0).then_some(mem as u64);

            out.push(AcceleratorInfo {
                kind: DeviceKind::Cuda,
                ordinal: ordinal as u32,
                vendor_id: VENDOR_NVIDIA,
                device_id: 0,
                vendor: "NVIDIA".into(),
                name,
                driver_version: driver_version.clone(),
                vram_bytes,
                integrated: false,
                software_renderer: false,
                software_reason: None,
            });
        }
        Ok(out)
    }
}

// --- ROCm (HIP) ---
type HipInit = unsafe extern "C" fn(u32) -> i32;
type HipGetDevCnt = unsafe extern "C" fn(*mut i32) -> i32;
type HipDrvVer = unsafe extern "C" fn(*mut i32) -> i32;

fn enumerate_rocm() -> Result<Vec<AcceleratorInfo>> {
    let lib = unsafe { Library::new("libamdhip64.so") }.map_err(|_| anyhow!("no_runtime"))?;
    unsafe {
        let hipInit: Symbol<HipInit> = lib.get(b"hipInit").context("get hipInit")?;
        let hipGetDeviceCount: Symbol<HipGetDevCnt> = lib
            .get(b"hipGetDeviceCount")
            .context("get hipGetDeviceCount")?;
        let hipDriverGetVersion: Option<Symbol<HipDrvVer>> = lib.get(b"hipDriverGetVersion").ok();

        if hipInit(0) != 0 {
            return Err(anyhow!("hipInit failed"));
        }
        let mut cnt = 0i32;
        if hipGetDeviceCount(&mut cnt) != 0 {
            return Err(anyhow!("hipGetDeviceCount failed"));
        }
        let driver_version = hipDriverGetVersion.and_then(|f| {
            let mut v = 0i32;
            (f(&mut v) == 0).then(|| v.to_string())
        });

        Ok((0..cnt.max(0))
            .map(|ordinal| AcceleratorInfo {
                kind: DeviceKind::Rocm,
                ordinal: ordinal as u32,
                vendor_id: VENDOR_AMD,
                device_id: 0,
                vendor: "AMD".into(),
                name: format!("ROCm device {ordinal}"),
                driver_version: driver_version.clone(),
                vram_bytes: None,
                integrated: false,
                software_renderer: false,
                software_reason: None,
            })
            .collect())
    }
}

// --- Vulkan ---
fn enumerate_vulkan() -> Result<Vec<AcceleratorInfo>> {
    let entry = unsafe { Entry::load() }?;
    let app = CString::new("gendrive-hwprof")?;
    let eng = CString::new("gendrive")?;

    let app_info = vk::ApplicationInfo {
        p_application_name: app.as_ptr(),
        p_engine_name: eng.as_ptr(),
        api_version: vk::API_VERSION_1_0,
        ..Default::default()
    };
    let ci = vk::InstanceCreateInfo {
        p_application_info: &app_info,
        ..Default::default()
    };
    let instance = unsafe { entry.create_instance(&ci, None) }?;
    let devices = unsafe { instance.enumerate_physical_devices() };
    let devices = match devices {
        Ok(d) => d,
        Err(e) => {
            unsafe { instance.destroy_instance(None) };
            return Err(e.into());
        }
    };

    let mut out = Vec::with_capacity(devices.len());
    for (ordinal, pd) in devices.into_iter().enumerate() {
        let props = unsafe { instance.get_physical_device_properties(pd) };
        let name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        let soft = if props.device_type == vk::PhysicalDeviceType::CPU {
            Some("cpu_adapter")
        } else {
            util::software_renderer_by_name(&name)
        };

        let mem_props = unsafe { instance.get_physical_device_memory_properties(pd) };

        out.push(AcceleratorInfo {
            kind: DeviceKind::Vulkan,
            ordinal: ordinal as u32,
            vendor_id: props.vendor_id,
            device_id: props.device_id,
            vendor: vendor_name(props.vendor_id).to_string(),
            name,
            driver_version: Some(props.driver_version.to_string()),
            vram_bytes: vram_from_heaps(&mem_props),
            integrated: props.device_type == vk::PhysicalDeviceType::INTEGRATED_GPU,
            software_renderer: soft.is_some(),
            software_reason: soft.map(str::to_string),
        });
    }

    unsafe { instance.destroy_instance(None) };
    Ok(out)
}

fn vram_from_heaps(props: &vk::PhysicalDeviceMemoryProperties) -> Option<u64> {
    let total: u64 = props.memory_heaps[..props.memory_heap_count as usize]
        .iter()
        .filter(|h| h.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
        .map(|h| h.size)
        .sum();
    (total > 0).then_some(total)
}
