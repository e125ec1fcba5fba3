use std::fmt;

use gendrive_abi::{BackendError, Device};
use thiserror::Error;

use crate::config::ConfigError;

/// Which generation call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WarmUp,
    Timed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::WarmUp => "warm-up",
            Phase::Timed => "timed",
        })
    }
}

/// Every way a run can end early. Backend diagnostics are carried verbatim;
/// nothing here is retried or recovered.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load {what} from `{source_id}`: {error}")]
    Load {
        what: &'static str,
        source_id: String,
        error: BackendError,
    },

    #[error("model optimization failed: {0}")]
    Optimize(BackendError),

    #[error("cannot place model on {device}: {error}")]
    Placement { device: Device, error: BackendError },

    #[error("tokenizer failed to encode the prompt: {0}")]
    Encode(BackendError),

    #[error("{phase} generation failed: {error}")]
    Generation { phase: Phase, error: BackendError },

    #[error("device synchronization on {device} failed: {error}")]
    Synchronize { device: Device, error: BackendError },

    #[error("tokenizer failed to decode the output: {0}")]
    Decode(BackendError),

    #[error("failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

impl DriverError {
    #[inline]
    pub fn is_config(&self) -> bool {
        matches!(self, DriverError::Config(_))
    }
}
