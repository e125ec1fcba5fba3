use std::ffi::CStr;
use std::path::Path;
use std::slice;
use std::sync::Arc;

use core::ffi::c_char;
use gendrive_abi::ffi::{
    GENDRIVE_ABI_VERSION, GdString, Int32Array, PLUGIN_ENTRY_SYMBOL, PluginApi, PluginEntryFn,
};
use libloading::Library;
use tracing::debug;

use super::PluginError;

/// A plugin vtable plus the library that backs it.
///
/// Handles created through the vtable keep an `Arc` to this, so the library
/// stays mapped until the last handle is destroyed.
pub struct LoadedPlugin {
    api: &'static PluginApi,
    id: String,
    version: String,
    // Dropped after `Drop::drop` has run the shutdown hook.
    _lib: Option<Library>,
}

// SAFETY: the vtable is immutable; plugins must tolerate calls from any thread.
unsafe impl Send for LoadedPlugin {}
unsafe impl Sync for LoadedPlugin {}

impl LoadedPlugin {
    pub fn open(path: &Path) -> Result<Arc<Self>, PluginError> {
        let lib = unsafe { Library::new(path) }.map_err(|source| PluginError::Library {
            path: path.to_path_buf(),
            source,
        })?;

        let api_ptr = {
            let entry: libloading::Symbol<PluginEntryFn> =
                unsafe { lib.get(PLUGIN_ENTRY_SYMBOL.as_bytes()) }.map_err(|source| {
                    PluginError::MissingSymbol {
                        symbol: PLUGIN_ENTRY_SYMBOL,
                        source,
                    }
                })?;
            unsafe { entry() }
        };
        if api_ptr.is_null() {
            return Err(PluginError::NullEntry);
        }

        // SAFETY: the entry contract is a pointer to a static vtable inside the
        // library image, and the library lives as long as `Self`.
        let api: &'static PluginApi = unsafe { &*api_ptr };
        let plugin = Self::init(api, Some(lib))?;
        debug!(
            target: "plugin",
            path = %path.display(),
            id = %plugin.id,
            version = %plugin.version,
            "plugin loaded"
        );
        Ok(plugin)
    }

    /// Wrap a vtable that is linked into the host binary.
    pub fn from_static(api: &'static PluginApi) -> Result<Arc<Self>, PluginError> {
        Self::init(api, None)
    }

    fn init(api: &'static PluginApi, lib: Option<Library>) -> Result<Arc<Self>, PluginError> {
        if api.info.abi_version != GENDRIVE_ABI_VERSION {
            return Err(PluginError::AbiMismatch {
                host: GENDRIVE_ABI_VERSION,
                plugin: api.info.abi_version,
            });
        }
        Ok(Arc::new(Self {
            api,
            id: unsafe { static_str(api.info.id) },
            version: unsafe { static_str(api.info.semver) },
            _lib: lib,
        }))
    }

    pub fn api(&self) -> &'static PluginApi {
        self.api
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The plugin's last-error text, or empty when it has none.
    pub(crate) fn last_error(&self) -> String {
        unsafe { self.take_string((self.api.last_error)()) }
    }

    /// Copy a plugin string out (lossy UTF-8) and hand the buffer back.
    ///
    /// # Safety
    /// `s` must come from this plugin and not have been freed.
    pub(crate) unsafe fn take_string(&self, s: GdString) -> String {
        if s.ptr.is_null() {
            return String::new();
        }
        let out = {
            let bytes = unsafe { slice::from_raw_parts(s.ptr as *const u8, s.len) };
            String::from_utf8_lossy(bytes).into_owned()
        };
        unsafe { (self.api.free_string)(s) };
        out
    }

    /// Copy plugin ids out and hand the buffer back. `None` means the call failed.
    ///
    /// # Safety
    /// `arr` must come from this plugin and not have been freed.
    pub(crate) unsafe fn take_ints(&self, arr: Int32Array) -> Option<Vec<i32>> {
        if arr.ptr.is_null() {
            return None;
        }
        let out = unsafe { slice::from_raw_parts(arr.ptr, arr.len) }.to_vec();
        unsafe { (self.api.free_ints)(arr) };
        Some(out)
    }
}

impl Drop for LoadedPlugin {
    fn drop(&mut self) {
        if let Some(shutdown) = self.api.shutdown {
            debug!(target: "plugin", id = %self.id, "plugin shutdown");
            unsafe { shutdown() };
        }
    }
}

unsafe fn static_str(p: *const c_char) -> String {
    if p.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()
}
