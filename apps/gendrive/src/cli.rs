use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gendrive_core::config::{DEFAULT_DEVICE, DEFAULT_MODEL, DEFAULT_N_PREDICT, DEFAULT_PROMPT};
use gendrive_core::{OutputFormat, RunArgs};
use gendrive_hwprof::ProfileCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Predict tokens with a causal language model and time the generation.
#[derive(Debug, Parser)]
#[command(name = "gendrive", version, about)]
pub struct Cli {
    /// Hub repo id (e.g. `mlabonne/phixtral-4x2_8`) or a local model directory
    #[arg(long = "repo-id-or-model-path", default_value = DEFAULT_MODEL)]
    pub repo_id_or_model_path: String,

    /// Prompt to infer
    #[arg(long, default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// Max tokens to predict
    #[arg(long, default_value_t = DEFAULT_N_PREDICT, allow_negative_numbers = true)]
    pub n_predict: i64,

    /// Target device: cpu, xpu[:n], cuda[:n], rocm[:n], vulkan[:n], metal
    #[arg(long, env = "GENDRIVE_DEVICE", default_value = DEFAULT_DEVICE)]
    pub device: String,

    /// Backend plugin library
    #[arg(long, env = "GENDRIVE_PLUGIN_PATH")]
    pub plugin: Option<PathBuf>,

    /// Prompt template with exactly one `{prompt}` placeholder
    #[arg(long)]
    pub prompt_template: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub output: Format,

    /// Skip the hardware preflight for the target device
    #[arg(long)]
    pub no_device_check: bool,

    /// Keep the detected hardware profile under GENDRIVE_HOME and reuse it
    #[arg(long, conflicts_with = "no_device_check")]
    pub hwprof_cache: bool,
}

impl Cli {
    pub fn run_args(&self) -> RunArgs {
        RunArgs {
            model: self.repo_id_or_model_path.clone(),
            prompt: self.prompt.clone(),
            n_predict: self.n_predict,
            device: self.device.clone(),
            prompt_template: self.prompt_template.clone(),
            output: self.output.into(),
        }
    }

    pub fn profile_cache(&self) -> ProfileCache {
        if self.hwprof_cache {
            ProfileCache::default_location()
        } else {
            ProfileCache::Off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["gendrive"]).unwrap();
        let args = cli.run_args();
        assert_eq!(args.model, "mlabonne/phixtral-4x2_8");
        assert_eq!(args.prompt, "What is AI?");
        assert_eq!(args.n_predict, 32);
        assert_eq!(args.output, OutputFormat::Text);
        assert!(!cli.no_device_check);
        assert_eq!(cli.profile_cache(), ProfileCache::Off);
    }

    #[test]
    fn profile_cache_is_opt_in() {
        let cli = Cli::try_parse_from(["gendrive", "--hwprof-cache"]).unwrap();
        assert!(matches!(cli.profile_cache(), ProfileCache::At(p) if p.ends_with("hwprof/profile.json")));

        let err = Cli::try_parse_from(["gendrive", "--hwprof-cache", "--no-device-check"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn negative_token_count_reaches_validation() {
        let cli = Cli::try_parse_from(["gendrive", "--n-predict", "-5"]).unwrap();
        assert_eq!(cli.n_predict, -5);
        assert!(cli.run_args().validate().is_err());
    }

    #[test]
    fn non_numeric_token_count_is_a_usage_error() {
        let err = Cli::try_parse_from(["gendrive", "--n-predict", "many"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn overrides() {
        let cli = Cli::try_parse_from([
            "gendrive",
            "--repo-id-or-model-path",
            "/models/phi",
            "--prompt",
            "Why is the sky blue?",
            "--n-predict",
            "8",
            "--device",
            "cuda:1",
            "--output",
            "json",
            "--no-device-check",
        ])
        .unwrap();
        let config = cli.run_args().validate().unwrap();
        assert_eq!(config.model(), "/models/phi");
        assert_eq!(config.max_new_tokens().get(), 8);
        assert_eq!(config.device().to_string(), "cuda:1");
        assert_eq!(config.output(), OutputFormat::Json);
        assert!(cli.no_device_check);
    }
}
