//! Capture process subsystem.
//!
//! This module starts the external capture engine as a detached background
//! process, supervises it until it exits, and terminates it gracefully on
//! request.
//!
//! Re-exports:
//! - [`CaptureController`]: spawns and stops capture processes.
//! - [`CaptureProcess`], [`CaptureRequest`], [`ProcessOutcome`], [`StopOutcome`]: core types.

pub mod capture_controller;
pub mod types;

pub use capture_controller::{CaptureController, TERMINATION_GRACE};
pub use types::{CaptureProcess, CaptureRequest, ProcessOutcome, StopOutcome};
