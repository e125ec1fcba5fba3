//! gendrive core: the single-shot generation driver around an external `Runtime`.

pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod report;
pub mod source;

pub use config::{OutputFormat, RunArgs, RunConfig};
pub use engine::{GenerationDriver, run_with_args};
pub use error::{DriverError, Phase};
pub use format::{PromptTemplate, format_prompt};
pub use report::Report;
pub use source::ModelSource;
