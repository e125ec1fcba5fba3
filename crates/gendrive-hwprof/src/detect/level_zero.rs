//! Intel GPU (XPU) enumeration through the oneAPI Level Zero loader.

#![allow(non_snake_case, non_camel_case_types)]

use anyhow::{Context, Result, anyhow};
use core::ffi::{c_char, c_void};
use gendrive_abi::DeviceKind;
use libloading::{Library, Symbol};
use std::ffi::CStr;

use crate::types::AcceleratorInfo;

type ze_result_t = u32;
type ze_driver_handle_t = *mut c_void;
type ze_device_handle_t = *mut c_void;

const ZE_RESULT_SUCCESS: ze_result_t = 0;
const ZE_INIT_FLAG_GPU_ONLY: u32 = 1;
const ZE_STRUCTURE_TYPE_DEVICE_PROPERTIES: u32 = 0x3;
const ZE_DEVICE_TYPE_GPU: u32 = 1;
const ZE_DEVICE_PROPERTY_FLAG_INTEGRATED: u32 = 1 << 0;
const ZE_MAX_DEVICE_NAME: usize = 256;
const ZE_MAX_DEVICE_UUID_SIZE: usize = 16;

#[repr(C)]
struct ze_device_properties_t {
    stype: u32,
    pNext: *mut c_void,
    device_type: u32,
    vendorId: u32,
    deviceId: u32,
    flags: u32,
    subdeviceId: u32,
    coreClockRate: u32,
    maxMemAllocSize: u64,
    maxHardwareContexts: u32,
    maxCommandQueuePriority: u32,
    numThreadsPerEU: u32,
    physicalEUSimdWidth: u32,
    numEUsPerSubslice: u32,
    numSubslicesPerSlice: u32,
    numSlices: u32,
    timerResolution: u64,
    timestampValidBits: u32,
    kernelTimestampValidBits: u32,
    uuid: [u8; ZE_MAX_DEVICE_UUID_SIZE],
    name: [c_char; ZE_MAX_DEVICE_NAME],
}

type ZeInit = unsafe extern "C" fn(u32) -> ze_result_t;
type ZeDriverGet = unsafe extern "C" fn(*mut u32, *mut ze_driver_handle_t) -> ze_result_t;
type ZeDeviceGet =
    unsafe extern "C" fn(ze_driver_handle_t, *mut u32, *mut ze_device_handle_t) -> ze_result_t;
type ZeDeviceGetProperties =
    unsafe extern "C" fn(ze_device_handle_t, *mut ze_device_properties_t) -> ze_result_t;

const CANDIDATES: &[&str] = &["libze_loader.so.1", "libze_loader.so"];

fn check(rc: ze_result_t, what: &str) -> Result<()> {
    if rc == ZE_RESULT_SUCCESS {
        Ok(())
    } else {
        Err(anyhow!("{what} failed: 0x{rc:x}"))
    }
}

/// GPU devices across all Level Zero drivers, numbered the way SYCL/IPEX number `xpu:N`.
pub fn enumerate_xpus() -> Result<Vec<AcceleratorInfo>> {
    let lib = CANDIDATES
        .iter()
        .find_map(|name| unsafe { Library::new(name) }.ok())
        .ok_or_else(|| anyhow!("no_loader"))?;

    unsafe {
        let zeInit: Symbol<ZeInit> = lib.get(b"zeInit").context("get zeInit")?;
        let zeDriverGet: Symbol<ZeDriverGet> =
            lib.get(b"zeDriverGet").context("get zeDriverGet")?;
        let zeDeviceGet: Symbol<ZeDeviceGet> =
            lib.get(b"zeDeviceGet").context("get zeDeviceGet")?;
        let zeDeviceGetProperties: Symbol<ZeDeviceGetProperties> = lib
            .get(b"zeDeviceGetProperties")
            .context("get zeDeviceGetProperties")?;

        check(zeInit(ZE_INIT_FLAG_GPU_ONLY), "zeInit")?;

        let mut n_drivers = 0u32;
        check(
            zeDriverGet(&mut n_drivers, std::ptr::null_mut()),
            "zeDriverGet(count)",
        )?;
        let mut drivers = vec![std::ptr::null_mut(); n_drivers as usize];
        check(
            zeDriverGet(&mut n_drivers, drivers.as_mut_ptr()),
            "zeDriverGet",
        )?;

        let mut out = Vec::new();
        for drv in drivers.into_iter().take(n_drivers as usize) {
            let mut n_devices = 0u32;
            check(
                zeDeviceGet(drv, &mut n_devices, std::ptr::null_mut()),
                "zeDeviceGet(count)",
            )?;
            let mut devices = vec![std::ptr::null_mut(); n_devices as usize];
            check(
                zeDeviceGet(drv, &mut n_devices, devices.as_mut_ptr()),
                "zeDeviceGet",
            )?;

            for dev in devices.into_iter().take(n_devices as usize) {
                let mut props: ze_device_properties_t = std::mem::zeroed();
                props.stype = ZE_STRUCTURE_TYPE_DEVICE_PROPERTIES;
                if zeDeviceGetProperties(dev, &mut props) != ZE_RESULT_SUCCESS {
                    continue;
                }
                if props.device_type != ZE_DEVICE_TYPE_GPU {
                    continue;
                }
                let name = CStr::from_ptr(props.name.as_ptr())
                    .to_string_lossy()
                    .into_owned();
                out.push(AcceleratorInfo {
                    kind: DeviceKind::Xpu,
                    ordinal: out.len() as u32,
                    vendor_id: props.vendorId,
                    device_id: props.deviceId,
                    vendor: "Intel".into(),
                    name,
                    driver_version: None,
                    vram_bytes: None,
                    integrated: props.flags & ZE_DEVICE_PROPERTY_FLAG_INTEGRATED != 0,
                    software_renderer: false,
                    software_reason: None,
                });
            }
        }
        Ok(out)
    }
}
