use std::fs;
use std::path::{Path, PathBuf};

use gendrive_hwprof::{plugins_dir, runtime_config_path};
use serde::Deserialize;
use tracing::{debug, warn};

use super::PluginError;

#[cfg(target_os = "windows")]
pub const DEFAULT_PLUGIN_FILE: &str = "gendrive_backend.dll";
#[cfg(target_os = "macos")]
pub const DEFAULT_PLUGIN_FILE: &str = "libgendrive_backend.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_PLUGIN_FILE: &str = "libgendrive_backend.so";

#[derive(Debug, Default, Deserialize)]
struct RuntimeJson {
    plugin: Option<PathBuf>,
}

/// Find the backend plugin library.
///
/// Order: `explicit` (`--plugin` / `GENDRIVE_PLUGIN_PATH`), the `plugin` key of
/// `runtime.json` in the gendrive home, then the default library name in the
/// plugins directory.
pub fn locate_plugin(explicit: Option<&Path>) -> Result<PathBuf, PluginError> {
    locate_in(explicit, &runtime_config_path(), &plugins_dir())
}

pub(crate) fn locate_in(
    explicit: Option<&Path>,
    runtime_json: &Path,
    plugins_dir: &Path,
) -> Result<PathBuf, PluginError> {
    if let Some(p) = explicit {
        // An explicit choice never silently falls through to another library.
        if p.is_file() {
            debug!(target: "plugin", path = %p.display(), "explicit plugin");
            return Ok(p.to_path_buf());
        }
        return Err(PluginError::Missing(p.to_path_buf()));
    }

    let mut searched = Vec::new();

    if let Some(p) = from_runtime_json(runtime_json) {
        if p.is_file() {
            debug!(target: "plugin", path = %p.display(), "plugin from runtime.json");
            return Ok(p);
        }
        warn!(
            target: "plugin",
            "runtime.json points to missing file: {}",
            p.display()
        );
        searched.push(p);
    } else {
        searched.push(runtime_json.to_path_buf());
    }

    let p = plugins_dir.join(DEFAULT_PLUGIN_FILE);
    if p.is_file() {
        debug!(target: "plugin", path = %p.display(), "default plugin");
        return Ok(p);
    }
    searched.push(p);

    Err(PluginError::NotFound { searched })
}

/// Relative paths are taken relative to the directory holding runtime.json.
fn from_runtime_json(path: &Path) -> Option<PathBuf> {
    let bytes = fs::read(path).ok()?;
    let cfg = match serde_json::from_slice::<RuntimeJson>(&bytes) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(target: "plugin", "ignoring malformed {}: {e}", path.display());
            return None;
        }
    };
    let plugin = cfg.plugin?;
    if plugin.is_absolute() {
        Some(plugin)
    } else {
        Some(path.parent().unwrap_or(Path::new(".")).join(plugin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("custom.so");
        touch(&lib);
        touch(&dir.path().join("plugins").join(DEFAULT_PLUGIN_FILE));

        let found = locate_in(
            Some(&lib),
            &dir.path().join("runtime.json"),
            &dir.path().join("plugins"),
        )
        .unwrap();
        assert_eq!(found, lib);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("plugins").join(DEFAULT_PLUGIN_FILE));
        let gone = dir.path().join("gone.so");

        let err = locate_in(
            Some(&gone),
            &dir.path().join("runtime.json"),
            &dir.path().join("plugins"),
        )
        .unwrap_err();
        assert!(matches!(err, PluginError::Missing(p) if p == gone));
    }

    #[test]
    fn runtime_json_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("backends").join("ipex.so");
        touch(&lib);
        let rj = dir.path().join("runtime.json");
        fs::write(&rj, br#"{ "plugin": "backends/ipex.so" }"#).unwrap();

        let found = locate_in(None, &rj, &dir.path().join("plugins")).unwrap();
        assert_eq!(found, lib);
    }

    #[test]
    fn falls_back_to_plugins_dir() {
        let dir = tempfile::tempdir().unwrap();
        let rj = dir.path().join("runtime.json");
        fs::write(&rj, b"not json").unwrap();
        let lib = dir.path().join("plugins").join(DEFAULT_PLUGIN_FILE);
        touch(&lib);

        assert_eq!(locate_in(None, &rj, &dir.path().join("plugins")).unwrap(), lib);
    }

    #[test]
    fn nothing_found_lists_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let rj = dir.path().join("runtime.json");
        fs::write(&rj, br#"{ "plugin": "/nowhere/lib.so" }"#).unwrap();

        let err = locate_in(None, &rj, &dir.path().join("plugins")).unwrap_err();
        match err {
            PluginError::NotFound { searched } => {
                assert_eq!(searched.len(), 2);
                assert_eq!(searched[0], PathBuf::from("/nowhere/lib.so"));
            }
            other => panic!("unexpected: {other}"),
        }
    }
}
