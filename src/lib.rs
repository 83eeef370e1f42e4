//! # voellmy-rs
//!
//! A two-dimensional explicit finite-volume solver for rapid
//! gravity-driven mass flows (rock and snow avalanches) over arbitrary
//! terrain, closed by a modified Voellmy rheology (Hergarten, 2024).
//!
//! This crate provides the core building blocks:
//! - Dense 2D fields over a regular grid ([`Field2D`])
//! - Immutable bed geometry with precomputed slopes ([`Terrain2D`])
//! - Active-rectangle tracking that shrinks per-step work to where
//!   flow exists
//! - Donor-cell advection of thickness and momentum
//! - Bed-plane momentum reprojection (centripetal correction)
//! - Thickness-weighted free-surface gradients with one-sided
//!   switching at local maxima
//! - Two-regime Coulomb / Voellmy friction with a thickness-aware
//!   crossover velocity ([`VoellmyParams`])
//! - A CFL-bounded stepping solver ([`VoellmySolver2D`]) and a run
//!   driver with snapshots and cancellation ([`Simulation`])
//!
//! # Example
//!
//! ```
//! use voellmy_rs::{Field2D, Simulation, VoellmyParams, VoellmySolver2D};
//!
//! // Release a pile on a 10% incline and run for 10 seconds.
//! let bed = Field2D::from_fn(24, 48, |_, j| -0.1 * j as f64);
//! let mut h0 = Field2D::zeros(24, 48);
//! for i in 10..14 {
//!     for j in 4..8 {
//!         h0.set(i, j, 2.0);
//!     }
//! }
//!
//! let params = VoellmyParams::default().with_h_min(0.01);
//! let mut solver = VoellmySolver2D::new(bed, h0, 1.0, 1.0, params).unwrap();
//!
//! let result = Simulation::new()
//!     .with_max_time(10.0)
//!     .with_dt_max(0.1)
//!     .with_cfl(0.7)
//!     .run(&mut solver)
//!     .unwrap();
//!
//! assert!(result.final_time > 10.0 - 1e-12);
//! ```

pub mod error;
pub mod simulation;
pub mod solver;
pub mod terrain;
pub mod types;

pub use error::SolverError;
pub use simulation::{RunResult, Simulation, SimulationConfig, Snapshot};
pub use solver::{H_EPS, VoellmyParams, VoellmySolver2D};
pub use solver::diagnostics::{active_cell_count, max_speed, total_mass, total_momentum};
pub use terrain::{Terrain2D, mirror_index};
pub use types::{Field2D, FlowRegime, Rect, SpatialParam};
