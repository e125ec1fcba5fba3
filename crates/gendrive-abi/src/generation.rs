use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Per-call generation settings handed to a backend's `generate`.
///
/// Built by the caller for every call and passed by value; there is no
/// shared, mutable "default" config. Crosses the C ABI as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Upper bound on newly generated tokens (prompt tokens excluded).
    pub max_new_tokens: NonZeroUsize,
    /// `false` means greedy (argmax) decoding.
    pub do_sample: bool,
    /// Reuse past key/value states between decode steps.
    pub use_cache: bool,
}

impl GenerationConfig {
    /// Greedy decoding with the KV cache enabled.
    pub fn new(max_new_tokens: NonZeroUsize) -> Self {
        Self {
            max_new_tokens,
            do_sample: false,
            use_cache: true,
        }
    }

    pub fn to_json(&self) -> String {
        // Three plain scalar fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
