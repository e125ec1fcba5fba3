use crate::types::HardwareProfile;
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json as json;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

pub const SCHEMA: u32 = 1;

pub fn load_cached_from(path: &Path) -> Option<HardwareProfile> {
    let buf = fs::read(path).ok()?;
    let p = json::from_slice::<HardwareProfile>(&buf).ok()?;
    // Older schemas are re-detected rather than migrated.
    (p.schema == SCHEMA).then_some(p)
}

/// Write via a temp file + rename so readers never see a torn profile.
pub fn save_profile_to(p: &HardwareProfile, path: &Path) -> Result<()> {
    let dir = path.parent().context("profile path has no parent")?;
    fs::create_dir_all(dir).with_context(|| format!("mkd {}", dir.display()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json::to_vec_pretty(p)?)
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename to {}", path.display()))?;
    Ok(())
}

/// Schema, fingerprint and timestamps for a freshly detected profile.
/// `created_at` carries over from `previous` while the fingerprint is unchanged.
pub fn stamp(mut p: HardwareProfile, previous: Option<&HardwareProfile>) -> Result<HardwareProfile> {
    p.schema = SCHEMA;
    p.fingerprint = compute_fingerprint(&p)?;
    let now = Utc::now().to_rfc3339();
    p.created_at = match previous {
        Some(prev) if prev.fingerprint == p.fingerprint => prev.created_at.clone(),
        _ => now.clone(),
    };
    p.updated_at = now;
    Ok(p)
}

pub fn compute_fingerprint(p: &HardwareProfile) -> Result<String> {
    let mut hasher = Sha256::new();

    // Stable identity bits
    hasher.update(p.os.as_bytes());
    hasher.update(p.arch.as_bytes());
    hasher.update(p.cpu.brand.as_bytes());
    hasher.update(p.cpu.threads.to_le_bytes());
    hasher.update([
        p.backends.cpu as u8,
        p.backends.cuda as u8,
        p.backends.rocm as u8,
        p.backends.xpu as u8,
        p.backends.vulkan as u8,
        p.backends.metal as u8,
    ]);

    for a in &p.accelerators {
        hasher.update(a.kind.as_str().as_bytes());
        hasher.update(a.ordinal.to_le_bytes());
        hasher.update(a.vendor_id.to_le_bytes());
        hasher.update(a.device_id.to_le_bytes());
        hasher.update(a.name.as_bytes());
        hasher.update([a.integrated as u8, a.software_renderer as u8]);
        if let Some(vram) = a.vram_bytes {
            hasher.update(vram.to_le_bytes());
        }
        if let Some(d) = &a.driver_version {
            hasher.update(d.as_bytes());
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::*;
    use gendrive_abi::DeviceKind;

    pub(crate) fn sample_profile() -> HardwareProfile {
        HardwareProfile {
            schema: SCHEMA,
            os: "linux".into(),
            arch: "x86_64".into(),
            cpu: CpuInfo {
                brand: "Test CPU".into(),
                threads: 8,
            },
            accelerators: vec![AcceleratorInfo {
                kind: DeviceKind::Xpu,
                ordinal: 0,
                vendor_id: 0x8086,
                device_id: 0x56a0,
                vendor: "Intel".into(),
                name: "Intel(R) Arc(TM) A770 Graphics".into(),
                driver_version: Some("1.3".into()),
                vram_bytes: Some(16 << 30),
                integrated: false,
                software_renderer: false,
                software_reason: None,
            }],
            backends: BackendSupport {
                cpu: true,
                xpu: true,
                ..Default::default()
            },
            backend_reasons: BackendReasons {
                cuda: Some("no_driver".into()),
                ..Default::default()
            },
            fingerprint: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            probe_ms_total: None,
            probe_times: None,
            diagnostics: None,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hwprof").join("profile.json");
        let p = stamp(sample_profile(), None).unwrap();

        save_profile_to(&p, &path).unwrap();
        let back = load_cached_from(&path).expect("cached profile");
        assert_eq!(back.fingerprint, p.fingerprint);
        assert_eq!(back.accelerators.len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn stale_schema_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        let mut p = sample_profile();
        p.schema = 0;
        save_profile_to(&p, &path).unwrap();
        assert!(load_cached_from(&path).is_none());
    }

    #[test]
    fn restamp_keeps_creation_time_for_same_hardware() {
        let mut first = stamp(sample_profile(), None).unwrap();
        first.created_at = "2024-01-01T00:00:00+00:00".into();

        let again = stamp(sample_profile(), Some(&first)).unwrap();
        assert_eq!(again.created_at, first.created_at);
        assert_ne!(again.updated_at, first.created_at);

        let mut changed = sample_profile();
        changed.accelerators.clear();
        let moved = stamp(changed, Some(&first)).unwrap();
        assert_ne!(moved.created_at, first.created_at);
    }

    #[test]
    fn save_under_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("home");
        fs::write(&blocker, "not a dir").unwrap();
        let path = blocker.join("cache").join("profile.json");
        assert!(save_profile_to(&sample_profile(), &path).is_err());
    }

    #[test]
    fn fingerprint_tracks_accelerators() {
        let a = sample_profile();
        let mut b = sample_profile();
        b.accelerators[0].name = "Intel(R) Data Center GPU Max 1550".into();
        assert_eq!(
            compute_fingerprint(&a).unwrap(),
            compute_fingerprint(&sample_profile()).unwrap()
        );
        assert_ne!(
            compute_fingerprint(&a).unwrap(),
            compute_fingerprint(&b).unwrap()
        );
    }
}
