//! High-level simulation driver: run loop, snapshots, cancellation.

mod runner;

pub use runner::{RunResult, Simulation, SimulationConfig, Snapshot};
