//! Run configuration: raw arguments in, validated immutable config out.

use std::num::NonZeroUsize;

use gendrive_abi::{Device, DeviceParseError};
use thiserror::Error;

use crate::format::{PromptTemplate, TemplateError};

pub const DEFAULT_MODEL: &str = "mlabonne/phixtral-4x2_8";
pub const DEFAULT_PROMPT: &str = "What is AI?";
pub const DEFAULT_N_PREDICT: i64 = 32;
pub const DEFAULT_DEVICE: &str = "xpu";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--n-predict must be a positive integer, got {0}")]
    NonPositiveTokens(i64),

    #[error("--n-predict {0} does not fit this platform")]
    TokensOutOfRange(i64),

    #[error("model identifier or path must not be empty")]
    EmptyModel,

    #[error(transparent)]
    Device(#[from] DeviceParseError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Unvalidated run arguments, as they arrive from a command line.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub model: String,
    pub prompt: String,
    pub n_predict: i64,
    pub device: String,
    pub prompt_template: Option<String>,
    pub output: OutputFormat,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            n_predict: DEFAULT_N_PREDICT,
            device: DEFAULT_DEVICE.to_string(),
            prompt_template: None,
            output: OutputFormat::Text,
        }
    }
}

impl RunArgs {
    /// The only way to build a `RunConfig`. Touches nothing outside this value.
    pub fn validate(self) -> Result<RunConfig, ConfigError> {
        if self.n_predict <= 0 {
            return Err(ConfigError::NonPositiveTokens(self.n_predict));
        }
        let max_new_tokens = usize::try_from(self.n_predict)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(ConfigError::TokensOutOfRange(self.n_predict))?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        let device: Device = self.device.parse()?;

        let template = match self.prompt_template.as_deref() {
            Some(pattern) => PromptTemplate::custom(pattern)?,
            None => PromptTemplate::default(),
        };

        Ok(RunConfig {
            model: self.model,
            prompt: self.prompt,
            max_new_tokens,
            device,
            template,
            output: self.output,
        })
    }
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    model: String,
    prompt: String,
    max_new_tokens: NonZeroUsize,
    device: Device,
    template: PromptTemplate,
    output: OutputFormat,
}

impl RunConfig {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn max_new_tokens(&self) -> NonZeroUsize {
        self.max_new_tokens
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gendrive_abi::DeviceKind;

    #[test]
    fn defaults_match_the_reference_run() {
        let cfg = RunArgs::default().validate().unwrap();
        assert_eq!(cfg.model(), "mlabonne/phixtral-4x2_8");
        assert_eq!(cfg.prompt(), "What is AI?");
        assert_eq!(cfg.max_new_tokens().get(), 32);
        assert_eq!(cfg.device(), &Device::xpu());
        assert_eq!(cfg.output(), OutputFormat::Text);
    }

    #[test]
    fn rejects_zero_and_negative_token_counts() {
        for n in [0, -5] {
            let args = RunArgs {
                n_predict: n,
                ..RunArgs::default()
            };
            assert_eq!(
                args.validate().unwrap_err(),
                ConfigError::NonPositiveTokens(n)
            );
        }
    }

    #[test]
    fn rejects_blank_model() {
        let args = RunArgs {
            model: "  ".into(),
            ..RunArgs::default()
        };
        assert_eq!(args.validate().unwrap_err(), ConfigError::EmptyModel);
    }

    #[test]
    fn parses_device() {
        let args = RunArgs {
            device: "cuda:1".into(),
            ..RunArgs::default()
        };
        let cfg = args.validate().unwrap();
        assert_eq!(cfg.device().kind, DeviceKind::Cuda);
        assert_eq!(cfg.device().ordinal, 1);

        let bad = RunArgs {
            device: "abacus".into(),
            ..RunArgs::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::Device(_))));
    }

    #[test]
    fn custom_template_is_validated() {
        let bad = RunArgs {
            prompt_template: Some("no placeholder".into()),
            ..RunArgs::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigError::Template(_))));

        let good = RunArgs {
            prompt_template: Some("<|user|>{prompt}<|assistant|>".into()),
            ..RunArgs::default()
        };
        let cfg = good.validate().unwrap();
        assert_eq!(cfg.template().render("hi"), "<|user|>hi<|assistant|>");
    }
}
