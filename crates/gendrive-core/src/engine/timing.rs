use std::time::{Duration, Instant};

use gendrive_abi::{Device, Runtime};

use crate::error::DriverError;

#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// Time `f` plus a device barrier. Without the barrier the clock could stop
/// while the accelerator still has queued work.
pub(super) fn time_on_device<R, T, F>(
    runtime: &R,
    device: &Device,
    f: F,
) -> Result<Timed<T>, DriverError>
where
    R: Runtime,
    F: FnOnce() -> Result<T, DriverError>,
{
    let start = Instant::now();
    let value = f()?;
    runtime
        .synchronize(device)
        .map_err(|error| DriverError::Synchronize {
            device: *device,
            error,
        })?;
    Ok(Timed {
        value,
        elapsed: start.elapsed(),
    })
}
