use dirs::data_dir;
use std::path::PathBuf;

const ENV_HOME: &str = "GENDRIVE_HOME";

/// ~/.local/share/gendrive (or platform-equivalent). `GENDRIVE_HOME` overrides.
pub fn gendrive_home() -> PathBuf {
    if let Some(p) = std::env::var_os(ENV_HOME) {
        return PathBuf::from(p);
    }
    data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("gendrive")
}

/// ~/.local/share/gendrive/plugins
pub fn plugins_dir() -> PathBuf {
    gendrive_home().join("plugins")
}

/// ~/.local/share/gendrive/runtime.json
pub fn runtime_config_path() -> PathBuf {
    gendrive_home().join("runtime.json")
}

/// ~/.local/share/gendrive/cache/hwprof/profile.json, only touched when caching is enabled.
pub fn hwprof_profile_path() -> PathBuf {
    gendrive_home().join("cache").join("hwprof").join("profile.json")
}
