//! gendrive hardware profiling crate.
//! Detects CPU and accelerators and answers whether a requested device exists
//! before a model is loaded onto it. Profiles are detected in memory; the
//! on-disk profile cache under `GENDRIVE_HOME` is opt-in.

pub mod cache;
pub mod detect;
pub mod device;
pub mod paths;
pub mod types;

pub use detect::detect_now;
pub use device::{HwprofError, ProfileCache, check_device, ensure_device};
pub use paths::{gendrive_home, hwprof_profile_path, plugins_dir, runtime_config_path};
pub use types::{
    AcceleratorInfo, BackendReasons, BackendSupport, CpuInfo, HardwareProfile, ProbeTimes,
};
