//! Error types for solver construction and time stepping.
//!
//! The error surface of the kernel is narrow: construction rejects
//! inconsistent inputs, `step` rejects invalid stepping parameters, and a
//! non-finite state after a step latches the solver into a diverged state
//! from which it cannot be stepped again.

use thiserror::Error;

/// Errors produced by solver construction, stepping, and the driver.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Bed and initial thickness grids do not share a shape.
    #[error("shape mismatch: bed is {bed_ny}x{bed_nx}, thickness is {h_ny}x{h_nx}")]
    ShapeMismatch {
        bed_ny: usize,
        bed_nx: usize,
        h_ny: usize,
        h_nx: usize,
    },

    /// Field data length inconsistent with the declared shape.
    #[error("field data length {len} does not match shape {ny}x{nx}")]
    FieldSize { ny: usize, nx: usize, len: usize },

    /// Cell sizes must be strictly positive.
    #[error("cell sizes must be positive, got dx = {dx}, dy = {dy}")]
    InvalidCellSize { dx: f64, dy: f64 },

    /// A physical or numerical parameter is out of its admissible range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The time step bound passed to `step` must be strictly positive.
    #[error("time step bound must be positive, got dt_max = {0}")]
    InvalidTimeStep(f64),

    /// The CFL number must lie in (0, 1].
    #[error("CFL number must lie in (0, 1], got {0}")]
    InvalidCfl(f64),

    /// Non-finite values appeared in the state. The solver is unusable
    /// afterwards; construct a new one to continue.
    #[error("non-finite values in solver state after step {step}; the solver cannot continue")]
    Diverged { step: usize },
}
