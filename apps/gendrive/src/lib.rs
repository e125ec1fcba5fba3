//! gendrive host: command line, logging and the backend plugin bridge.

pub mod cli;
pub mod logging;
pub mod plugin;

pub use cli::Cli;
