//! Backend plugins: locate the shared library, load its vtable, and expose it
//! to the driver as a `Runtime`.

use std::path::PathBuf;

use thiserror::Error;

mod loader;
mod locate;
mod runtime;

pub use loader::LoadedPlugin;
pub use locate::{DEFAULT_PLUGIN_FILE, locate_plugin};
pub use runtime::{PluginModel, PluginRuntime, PluginTokenizer};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin file does not exist: {}", .0.display())]
    Missing(PathBuf),

    #[error(
        "no backend plugin found (searched: {}); pass --plugin or set GENDRIVE_PLUGIN_PATH",
        display_paths(.searched)
    )]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to load plugin library {}: {source}", .path.display())]
    Library {
        path: PathBuf,
        source: libloading::Error,
    },

    #[error("missing symbol {symbol}: {source}")]
    MissingSymbol {
        symbol: &'static str,
        source: libloading::Error,
    },

    #[error("plugin entry returned null")]
    NullEntry,

    #[error("ABI mismatch: host={host} plugin={plugin}")]
    AbiMismatch { host: u32, plugin: u32 },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
