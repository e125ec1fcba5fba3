use crate::device::Device;
use crate::generation::GenerationConfig;
use crate::token::Token;

/// Failure reported by a backend. Carries the backend's own diagnostic verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self(msg.into())
    }
}

impl From<String> for BackendError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BackendError {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Opaque tokenizer handle paired with a model.
pub trait Tokenizer {
    fn encode(&self, text: &str) -> BackendResult<Vec<Token>>;

    /// Decode ids to text. Invalid UTF-8 from the backend is replaced, never rejected.
    fn decode(&self, tokens: &[Token], skip_special_tokens: bool) -> BackendResult<String>;
}

/// Opaque causal language model handle.
pub trait CausalLm {
    /// Run generation for `input`. The backend stages the ids on whatever device
    /// the model lives on. Returns the full sequence: the input ids followed by
    /// at most `config.max_new_tokens` new ids.
    fn generate(&mut self, input: &[Token], config: &GenerationConfig)
    -> BackendResult<Vec<Token>>;
}

/// Backend-agnostic entry point: everything the driver needs from the outside world.
///
/// Handles are plain owned values; dropping them releases the backend resources.
pub trait Runtime {
    type Model: CausalLm;
    type Tokenizer: Tokenizer;

    /// Cheap check that `device` exists before anything heavy is loaded.
    fn check_device(&self, _device: &Device) -> BackendResult<()> {
        Ok(())
    }

    /// `source` is a local directory/file or a hub repo id.
    fn load_model(&self, source: &str) -> BackendResult<Self::Model>;

    fn load_tokenizer(&self, source: &str) -> BackendResult<Self::Tokenizer>;

    /// Rewrite the model for efficient execution. Behaviour must be preserved.
    fn optimize(&self, model: Self::Model) -> BackendResult<Self::Model>;

    fn to_device(&self, model: Self::Model, device: &Device) -> BackendResult<Self::Model>;

    /// Block until all queued work on `device` has finished.
    fn synchronize(&self, device: &Device) -> BackendResult<()>;
}
