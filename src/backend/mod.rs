//! Accelerator execution backends.
//!
//! Two interchangeable implementations share one capability surface,
//! matching the source design's separation between the simulator
//! (`simu_backend.c`, run on the host for development/testing) and the real
//! device path. Only the simulated backend is implemented here; the device
//! backend is declared so the capability surface is visible in the type
//! system without fabricating a hardware dependency this crate can't
//! exercise.

pub mod simulated;

use crate::error::Result;
use crate::types::{Request, ResultRecord};

/// Capability surface every accelerator backend exposes: allocate, load
/// each slot's scratch input, run one pass, wait for completion, free.
pub trait AcceleratorBackend {
    fn init(&mut self, nb_slots: usize) -> Result<()>;
    fn load_scratch(&mut self, slot: usize, requests: &[Request]) -> Result<()>;
    fn run_pass(&mut self) -> Result<()>;
    fn wait_pass(&mut self) -> Result<Vec<Vec<ResultRecord>>>;
    fn free(&mut self) -> Result<()>;

    /// Round index (0, 1, 2), driving the next `run_pass`'s `delta`/`nbr_len`.
    /// No-op for backends that don't need it (e.g. the device stub).
    fn set_round(&mut self, _round: usize) {}
}

/// Declared but unimplemented: the real device SDK is out of scope for
/// this crate. Exists so callers can name the type without a fabricated
/// hardware dependency standing in for it.
pub struct AcceleratorDeviceBackend;

impl AcceleratorBackend for AcceleratorDeviceBackend {
    fn init(&mut self, _nb_slots: usize) -> Result<()> {
        Err(crate::error::UpvcError::Unsupported("accelerator device backend is not implemented".into()))
    }

    fn load_scratch(&mut self, _slot: usize, _requests: &[Request]) -> Result<()> {
        Err(crate::error::UpvcError::Unsupported("accelerator device backend is not implemented".into()))
    }

    fn run_pass(&mut self) -> Result<()> {
        Err(crate::error::UpvcError::Unsupported("accelerator device backend is not implemented".into()))
    }

    fn wait_pass(&mut self) -> Result<Vec<Vec<ResultRecord>>> {
        Err(crate::error::UpvcError::Unsupported("accelerator device backend is not implemented".into()))
    }

    fn free(&mut self) -> Result<()> {
        Err(crate::error::UpvcError::Unsupported("accelerator device backend is not implemented".into()))
    }
}
