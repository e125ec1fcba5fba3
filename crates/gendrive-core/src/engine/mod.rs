//! Generation driver: one straight pass from validated config to printed report.
//!
//! configure → preflight → load → optimize → place → format → encode
//! → warm up → timed run (with barrier) → decode → report

use std::io::Write;

use gendrive_abi::{CausalLm, GenerationConfig, Runtime, Token, Tokenizer};
use tracing::{debug, info, info_span};

use crate::config::{RunArgs, RunConfig};
use crate::error::{DriverError, Phase};
use crate::report::Report;
use crate::source::ModelSource;

mod timing;

pub use timing::Timed;
use timing::time_on_device;

/// Drives a single run against any `Runtime`. Owns nothing between runs.
pub struct GenerationDriver<'r, R: Runtime> {
    runtime: &'r R,
}

impl<'r, R: Runtime> GenerationDriver<'r, R> {
    pub fn new(runtime: &'r R) -> Self {
        Self { runtime }
    }

    pub fn run(&self, config: &RunConfig) -> Result<Report, DriverError> {
        let _span =
            info_span!("run", model = config.model(), device = %config.device()).entered();
        let device = config.device();

        self.runtime
            .check_device(device)
            .map_err(|error| DriverError::Placement {
                device: *device,
                error,
            })?;

        let source = ModelSource::resolve(config.model());
        let locator = source.locator();
        info!(%source, "loading model");

        let model = self
            .runtime
            .load_model(&locator)
            .map_err(|error| DriverError::Load {
                what: "model",
                source_id: locator.clone(),
                error,
            })?;

        info!("optimizing model");
        let model = self
            .runtime
            .optimize(model)
            .map_err(DriverError::Optimize)?;

        info!(%device, "placing model");
        let mut model =
            self.runtime
                .to_device(model, device)
                .map_err(|error| DriverError::Placement {
                    device: *device,
                    error,
                })?;

        let tokenizer = self
            .runtime
            .load_tokenizer(&locator)
            .map_err(|error| DriverError::Load {
                what: "tokenizer",
                source_id: locator.clone(),
                error,
            })?;

        let prompt = config.template().render(config.prompt());
        let input_ids = tokenizer.encode(&prompt).map_err(DriverError::Encode)?;
        debug!(prompt_tokens = input_ids.len(), "encoded prompt");

        // Greedy with the KV cache, for both runs. Built here, never global.
        let gen_cfg = GenerationConfig::new(config.max_new_tokens());

        info!(max_new_tokens = config.max_new_tokens().get(), "warm-up generation");
        let _ = generate(&mut model, &input_ids, &gen_cfg, Phase::WarmUp)?;

        info!("timed generation");
        let Timed {
            value: output_ids,
            elapsed,
        } = time_on_device(self.runtime, device, || {
            generate(&mut model, &input_ids, &gen_cfg, Phase::Timed)
        })?;
        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            output_tokens = output_ids.len(),
            "timed run done"
        );

        let output = tokenizer
            .decode(&output_ids, true)
            .map_err(DriverError::Decode)?;

        Ok(Report {
            model: config.model().to_string(),
            device: *device,
            prompt,
            output,
            elapsed,
            prompt_tokens: input_ids.len(),
            output_tokens: output_ids.len(),
        })
    }
}

fn generate<M: CausalLm>(
    model: &mut M,
    input: &[Token],
    cfg: &GenerationConfig,
    phase: Phase,
) -> Result<Vec<Token>, DriverError> {
    model
        .generate(input, cfg)
        .map_err(|error| DriverError::Generation { phase, error })
}

/// Validate `args`, run, and write the report to `out`.
///
/// Validation happens before the runtime is touched at all, so a bad
/// argument never triggers a load.
pub fn run_with_args<R: Runtime, W: Write>(
    runtime: &R,
    args: RunArgs,
    out: &mut W,
) -> Result<Report, DriverError> {
    let config = args.validate()?;
    let report = GenerationDriver::new(runtime).run(&config)?;
    report.write(config.output(), out)?;
    Ok(report)
}
