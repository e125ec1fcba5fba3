use core::ffi::c_void;
use std::ffi::CString;
use std::ptr::NonNull;
use std::sync::Arc;

use gendrive_abi::ffi::ERR_OK;
use gendrive_abi::{
    BackendError, BackendResult, CausalLm, Device, GenerationConfig, Runtime, Token, Tokenizer,
    from_raw_ids, raw_ids,
};
use gendrive_hwprof::ProfileCache;
use tracing::debug;

use super::loader::LoadedPlugin;

fn make_cstring(s: &str) -> BackendResult<CString> {
    CString::new(s).map_err(|_| BackendError::new("string contains interior NUL"))
}

/// Build a `BackendError` from the plugin's last error, or `op failed` if it set none.
fn plugin_error(plugin: &LoadedPlugin, op: &str) -> BackendError {
    let msg = plugin.last_error();
    if msg.is_empty() {
        BackendError::new(format!("{op} failed"))
    } else {
        BackendError::new(msg)
    }
}

fn check(plugin: &LoadedPlugin, rc: i32, op: &str) -> BackendResult<()> {
    if rc == ERR_OK {
        Ok(())
    } else {
        Err(plugin_error(plugin, op))
    }
}

/// `Runtime` over a loaded plugin's C ABI.
pub struct PluginRuntime {
    plugin: Arc<LoadedPlugin>,
    device_check: bool,
    profile_cache: ProfileCache,
}

impl PluginRuntime {
    pub fn new(plugin: Arc<LoadedPlugin>) -> Self {
        Self {
            plugin,
            device_check: true,
            profile_cache: ProfileCache::Off,
        }
    }

    /// Let the device check reuse and refresh an on-disk hardware profile.
    pub fn with_profile_cache(mut self, cache: ProfileCache) -> Self {
        self.profile_cache = cache;
        self
    }

    /// Trust the requested device without consulting the hardware profile.
    pub fn without_device_check(mut self) -> Self {
        self.device_check = false;
        self
    }

    pub fn plugin(&self) -> &LoadedPlugin {
        &self.plugin
    }
}

pub struct PluginModel {
    plugin: Arc<LoadedPlugin>,
    handle: NonNull<c_void>,
}

impl Drop for PluginModel {
    fn drop(&mut self) {
        unsafe { (self.plugin.api().model.destroy)(self.handle.as_ptr()) };
    }
}

pub struct PluginTokenizer {
    plugin: Arc<LoadedPlugin>,
    handle: NonNull<c_void>,
}

impl Drop for PluginTokenizer {
    fn drop(&mut self) {
        unsafe { (self.plugin.api().tokenizer.destroy)(self.handle.as_ptr()) };
    }
}

impl Runtime for PluginRuntime {
    type Model = PluginModel;
    type Tokenizer = PluginTokenizer;

    fn check_device(&self, device: &Device) -> BackendResult<()> {
        if !self.device_check {
            debug!(target: "plugin", %device, "device check skipped");
            return Ok(());
        }
        gendrive_hwprof::ensure_device(device, &self.profile_cache)
            .map_err(|e| BackendError::new(e.to_string()))
    }

    fn load_model(&self, source: &str) -> BackendResult<PluginModel> {
        let csrc = make_cstring(source)?;
        let raw = unsafe { (self.plugin.api().model.load)(csrc.as_ptr()) };
        let handle = NonNull::new(raw).ok_or_else(|| plugin_error(&self.plugin, "model load"))?;
        Ok(PluginModel {
            plugin: self.plugin.clone(),
            handle,
        })
    }

    fn load_tokenizer(&self, source: &str) -> BackendResult<PluginTokenizer> {
        let csrc = make_cstring(source)?;
        let raw = unsafe { (self.plugin.api().tokenizer.load)(csrc.as_ptr()) };
        let handle =
            NonNull::new(raw).ok_or_else(|| plugin_error(&self.plugin, "tokenizer load"))?;
        Ok(PluginTokenizer {
            plugin: self.plugin.clone(),
            handle,
        })
    }

    fn optimize(&self, model: PluginModel) -> BackendResult<PluginModel> {
        let rc = unsafe { (self.plugin.api().model.optimize)(model.handle.as_ptr()) };
        check(&self.plugin, rc, "optimize")?;
        Ok(model)
    }

    fn to_device(&self, model: PluginModel, device: &Device) -> BackendResult<PluginModel> {
        let cdev = make_cstring(&device.to_string())?;
        let rc = unsafe { (self.plugin.api().model.to_device)(model.handle.as_ptr(), cdev.as_ptr()) };
        check(&self.plugin, rc, "to_device")?;
        Ok(model)
    }

    fn synchronize(&self, device: &Device) -> BackendResult<()> {
        let cdev = make_cstring(&device.to_string())?;
        let rc = unsafe { (self.plugin.api().model.synchronize)(cdev.as_ptr()) };
        check(&self.plugin, rc, "synchronize")
    }
}

impl CausalLm for PluginModel {
    fn generate(
        &mut self,
        input: &[Token],
        config: &GenerationConfig,
    ) -> BackendResult<Vec<Token>> {
        let ids = raw_ids(input);
        let cfg = make_cstring(&config.to_json())?;
        let arr = unsafe {
            (self.plugin.api().model.generate)(
                self.handle.as_ptr(),
                ids.as_ptr(),
                ids.len(),
                cfg.as_ptr(),
            )
        };
        let out = unsafe { self.plugin.take_ints(arr) }
            .ok_or_else(|| plugin_error(&self.plugin, "generate"))?;
        Ok(from_raw_ids(&out))
    }
}

impl Tokenizer for PluginTokenizer {
    fn encode(&self, text: &str) -> BackendResult<Vec<Token>> {
        let ctext = make_cstring(text)?;
        let arr = unsafe { (self.plugin.api().tokenizer.encode)(self.handle.as_ptr(), ctext.as_ptr()) };
        let ids = unsafe { self.plugin.take_ints(arr) }
            .ok_or_else(|| plugin_error(&self.plugin, "encode"))?;
        Ok(from_raw_ids(&ids))
    }

    fn decode(&self, tokens: &[Token], skip_special_tokens: bool) -> BackendResult<String> {
        let ids = raw_ids(tokens);
        let s = unsafe {
            (self.plugin.api().tokenizer.decode)(
                self.handle.as_ptr(),
                ids.as_ptr(),
                ids.len(),
                skip_special_tokens,
            )
        };
        if s.ptr.is_null() {
            return Err(plugin_error(&self.plugin, "decode"));
        }
        Ok(unsafe { self.plugin.take_string(s) })
    }
}
