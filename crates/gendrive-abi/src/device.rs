//! Target device naming shared by the host, the plugins and the hardware profiler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Cuda,
    Rocm,
    /// Intel GPU through oneAPI Level Zero.
    Xpu,
    Vulkan,
    Metal,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Cpu => "cpu",
            DeviceKind::Cuda => "cuda",
            DeviceKind::Rocm => "rocm",
            DeviceKind::Xpu => "xpu",
            DeviceKind::Vulkan => "vulkan",
            DeviceKind::Metal => "metal",
        }
    }

    #[inline]
    pub fn is_accelerator(&self) -> bool {
        !matches!(self, DeviceKind::Cpu)
    }
}

impl FromStr for DeviceKind {
    type Err = DeviceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(DeviceKind::Cpu),
            "cuda" => Ok(DeviceKind::Cuda),
            "rocm" | "hip" => Ok(DeviceKind::Rocm),
            "xpu" => Ok(DeviceKind::Xpu),
            "vulkan" => Ok(DeviceKind::Vulkan),
            "metal" | "mps" => Ok(DeviceKind::Metal),
            other => Err(DeviceParseError(format!("unknown device kind `{other}`"))),
        }
    }
}

/// A device such as `xpu:0` or `cpu`. The CPU has no ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Device {
    pub kind: DeviceKind,
    pub ordinal: u32,
}

impl Device {
    pub const CPU: Device = Device {
        kind: DeviceKind::Cpu,
        ordinal: 0,
    };

    pub fn new(kind: DeviceKind, ordinal: u32) -> Self {
        let ordinal = if kind.is_accelerator() { ordinal } else { 0 };
        Self { kind, ordinal }
    }

    /// First Intel XPU, the default target.
    pub fn xpu() -> Self {
        Self::new(DeviceKind::Xpu, 0)
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::xpu()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.is_accelerator() {
            write!(f, "{}:{}", self.kind.as_str(), self.ordinal)
        } else {
            f.write_str(self.kind.as_str())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid device: {0}")]
pub struct DeviceParseError(pub String);

impl FromStr for Device {
    type Err = DeviceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DeviceParseError("empty device string".into()));
        }
        let (kind, ordinal) = match s.split_once(':') {
            Some((k, o)) => {
                let ordinal = o
                    .parse::<u32>()
                    .map_err(|_| DeviceParseError(format!("bad ordinal `{o}` in `{s}`")))?;
                (k.parse::<DeviceKind>()?, ordinal)
            }
            None => (s.parse::<DeviceKind>()?, 0),
        };
        if kind == DeviceKind::Cpu && ordinal != 0 {
            return Err(DeviceParseError(format!("cpu takes no ordinal: `{s}`")));
        }
        Ok(Device::new(kind, ordinal))
    }
}

impl TryFrom<String> for Device {
    type Error = DeviceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(d: Device) -> String {
        d.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_kind_defaults_to_ordinal_zero() {
        let d: Device = "xpu".parse().unwrap();
        assert_eq!(d, Device::xpu());
        assert_eq!(d.to_string(), "xpu:0");
    }

    #[test]
    fn parses_ordinals_and_aliases() {
        assert_eq!(
            "cuda:1".parse::<Device>().unwrap(),
            Device::new(DeviceKind::Cuda, 1)
        );
        assert_eq!("HIP:2".parse::<Device>().unwrap().kind, DeviceKind::Rocm);
        assert_eq!("mps".parse::<Device>().unwrap().kind, DeviceKind::Metal);
        assert_eq!("cpu".parse::<Device>().unwrap().to_string(), "cpu");
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Device>().is_err());
        assert!("tpu".parse::<Device>().is_err());
        assert!("xpu:one".parse::<Device>().is_err());
        assert!("cpu:1".parse::<Device>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let js = serde_json::to_string(&Device::new(DeviceKind::Vulkan, 3)).unwrap();
        assert_eq!(js, "\"vulkan:3\"");
        let back: Device = serde_json::from_str(&js).unwrap();
        assert_eq!(back, Device::new(DeviceKind::Vulkan, 3));
    }
}
