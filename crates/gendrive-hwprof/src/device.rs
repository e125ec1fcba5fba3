//! "Is this device actually there?" answered from the hardware profile.

use std::path::{Path, PathBuf};

use gendrive_abi::{Device, DeviceKind};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{load_cached_from, save_profile_to, stamp};
use crate::detect::detect_now;
use crate::paths::hwprof_profile_path;
use crate::types::HardwareProfile;

#[derive(Debug, Error)]
pub enum HwprofError {
    #[error("device {device} unavailable: {reason}")]
    DeviceUnavailable { device: Device, reason: String },

    #[error("hardware detection failed: {0:#}")]
    Detect(#[from] anyhow::Error),
}

/// Check `device` against `profile`. The CPU is always present.
pub fn check_device(profile: &HardwareProfile, device: &Device) -> Result<(), HwprofError> {
    if device.kind == DeviceKind::Cpu {
        return Ok(());
    }

    let unavailable = |reason: String| HwprofError::DeviceUnavailable {
        device: *device,
        reason,
    };

    if !profile.backends.get(device.kind) {
        let why = profile
            .backend_reasons
            .get(device.kind)
            .unwrap_or("not_detected");
        return Err(unavailable(format!(
            "no {} backend ({why})",
            device.kind.as_str()
        )));
    }

    let count = profile.usable(device.kind).count();
    if profile
        .usable(device.kind)
        .any(|a| a.ordinal == device.ordinal)
    {
        Ok(())
    } else {
        Err(unavailable(format!(
            "ordinal {} out of range ({count} {} device(s))",
            device.ordinal,
            device.kind.as_str()
        )))
    }
}

/// Where `ensure_device` may keep a detected profile between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileCache {
    /// Detect in memory every run; nothing is written.
    #[default]
    Off,
    At(PathBuf),
}

impl ProfileCache {
    /// `<GENDRIVE_HOME>/cache/hwprof/profile.json`
    pub fn default_location() -> Self {
        ProfileCache::At(hwprof_profile_path())
    }

    fn path(&self) -> Option<&Path> {
        match self {
            ProfileCache::Off => None,
            ProfileCache::At(p) => Some(p),
        }
    }
}

/// Fails only when `device` is absent. The CPU never triggers detection.
pub fn ensure_device(device: &Device, cache: &ProfileCache) -> Result<(), HwprofError> {
    ensure_device_with(device, cache, detect_now)
}

pub(crate) fn ensure_device_with<F>(
    device: &Device,
    cache: &ProfileCache,
    detect: F,
) -> Result<(), HwprofError>
where
    F: FnOnce() -> anyhow::Result<HardwareProfile>,
{
    if device.kind == DeviceKind::Cpu {
        return Ok(());
    }

    let cached = cache.path().and_then(load_cached_from);
    if let Some(p) = &cached {
        if check_device(p, device).is_ok() {
            debug!(target: "hwprof", %device, "found in cached profile");
            return Ok(());
        }
        debug!(target: "hwprof", %device, "not in cached profile; re-detecting");
    }

    let fresh = detect()?;
    debug!(
        target: "hwprof",
        accelerators = fresh.accelerators.len(),
        ms = ?fresh.probe_ms_total,
        times = ?fresh.probe_times,
        "detected"
    );

    if let Some(path) = cache.path() {
        let saved = stamp(fresh.clone(), cached.as_ref())
            .and_then(|p| save_profile_to(&p, path));
        if let Err(e) = saved {
            warn!(target: "hwprof", path = %path.display(), "profile cache not written: {e:#}");
        }
    }

    check_device(&fresh, device)
}
