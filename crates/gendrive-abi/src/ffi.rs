use core::ffi::{c_char, c_void};

/// Bump this when you break the ABI. Host checks it at load time.
pub const GENDRIVE_ABI_VERSION: u32 = 1;

pub const PLUGIN_ENTRY_SYMBOL: &str = "gendrive_plugin_entry_v1";

pub const ERR_OK: i32 = 0;
pub const ERR_FAIL: i32 = 1;

/// Plugin-owned UTF-8 bytes. Release with `PluginApi::free_string`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GdString {
    pub ptr: *mut c_char,
    pub len: usize,
}

impl GdString {
    pub const fn null() -> Self {
        Self {
            ptr: core::ptr::null_mut(),
            len: 0,
        }
    }
}

/// Plugin-owned token ids. Release with `PluginApi::free_ints`.
///
/// `ptr == null` signals an error (see `last_error`); an empty but valid
/// sequence is a non-null pointer with `len == 0`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Int32Array {
    pub ptr: *mut i32,
    pub len: usize,
}

impl Int32Array {
    pub const fn null() -> Self {
        Self {
            ptr: core::ptr::null_mut(),
            len: 0,
        }
    }
}

#[repr(C)]
pub struct PluginInfo {
    pub abi_version: u32,
    pub id: *const c_char,     // "ipex"
    pub semver: *const c_char, // "0.1.0"
}

// ---------- Function pointer types (C ABI) ----------

/// `source` is a local path or hub repo id. Returns null on failure.
pub type LoadHandleFn = unsafe extern "C" fn(source: *const c_char) -> *mut c_void;
pub type DestroyHandleFn = unsafe extern "C" fn(handle: *mut c_void);

/// In-place rewrite of the model for the target accelerator.
pub type OptimizeFn = unsafe extern "C" fn(model: *mut c_void) -> i32;
/// `device` is the `Device` display form (`xpu:0`, `cpu`).
pub type ToDeviceFn = unsafe extern "C" fn(model: *mut c_void, device: *const c_char) -> i32;

/// `config_json` is UTF-8 JSON of `GenerationConfig`.
/// Returns the full sequence (input ids followed by new ids).
pub type GenerateFn = unsafe extern "C" fn(
    model: *mut c_void,
    ids: *const i32,
    len: usize,
    config_json: *const c_char,
) -> Int32Array;

pub type SynchronizeFn = unsafe extern "C" fn(device: *const c_char) -> i32;

pub type EncodeFn = unsafe extern "C" fn(tokenizer: *mut c_void, text: *const c_char) -> Int32Array;
pub type DecodeFn = unsafe extern "C" fn(
    tokenizer: *mut c_void,
    ids: *const i32,
    len: usize,
    skip_special_tokens: bool,
) -> GdString;

pub type LastErrorFn = unsafe extern "C" fn() -> GdString;
pub type FreeStringFn = unsafe extern "C" fn(s: GdString);
pub type FreeIntsFn = unsafe extern "C" fn(arr: Int32Array);
pub type ShutdownFn = unsafe extern "C" fn();

// ---------- VTables ----------

#[repr(C)]
pub struct ModelApi {
    pub load: LoadHandleFn,
    pub destroy: DestroyHandleFn,
    pub optimize: OptimizeFn,
    pub to_device: ToDeviceFn,
    pub generate: GenerateFn,
    pub synchronize: SynchronizeFn,
}

#[repr(C)]
pub struct TokenizerApi {
    pub load: LoadHandleFn,
    pub destroy: DestroyHandleFn,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
}

#[repr(C)]
pub struct PluginApi {
    pub info: PluginInfo,
    pub model: ModelApi,
    pub tokenizer: TokenizerApi,

    // Diagnostics & memory management
    pub last_error: LastErrorFn,
    pub free_string: FreeStringFn,
    pub free_ints: FreeIntsFn,

    /// Called once before the host unloads the library. May be absent.
    pub shutdown: Option<ShutdownFn>,
}

// SAFETY: the vtable is immutable static data; the raw pointers in `info`
// point at static C strings inside the plugin image.
unsafe impl Sync for PluginApi {}

/// Plugin must export `gendrive_plugin_entry_v1` returning a pointer to a static `PluginApi`.
pub type PluginEntryFn = unsafe extern "C" fn() -> *const PluginApi;
