//! gendrive ABI crate: stable contracts shared by the host driver and runtime plugins.

pub mod backend;
pub mod device;
pub mod ffi;
pub mod generation;
pub mod token;

pub use backend::*;
pub use device::*;
pub use generation::*;
pub use token::*;
