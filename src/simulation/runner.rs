//! Simulation driver.
//!
//! Wraps the per-step solver into a complete run: iterate
//! [`VoellmySolver2D::step`] until a step or time cap is hit, track
//! `dt` statistics, record thickness snapshots at a configurable step
//! interval, and honour a cooperative cancellation flag.
//!
//! A converged flow (every cell stopped) is not a stop condition; the
//! loop runs to its caps, which is what makes runs reproducible across
//! parameter sets that stop at different times.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SolverError;
use crate::solver::VoellmySolver2D;
use crate::types::Field2D;

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Maximum number of steps (`None` = unbounded).
    pub max_steps: Option<usize>,
    /// Maximum simulated time (s).
    pub max_time: f64,
    /// Upper bound on the step size (s).
    pub dt_max: f64,
    /// Courant number for the CFL bound (`None` = no CFL capping).
    pub cfl: Option<f64>,
    /// Record a snapshot every this many steps (`None` = never).
    /// Measured in steps, not seconds.
    pub output_every: Option<usize>,
    /// Print progress lines to stdout.
    pub verbose: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: None,
            max_time: 1000.0,
            dt_max: 1.0,
            cfl: Some(0.7),
            output_every: None,
            verbose: false,
        }
    }
}

/// A recorded `(time, thickness)` pair.
///
/// The thickness is an owned copy; snapshots never alias solver state.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Simulated time of the record (s).
    pub time: f64,
    /// Thickness field at that time.
    pub thickness: Field2D,
}

/// Result of a simulation run.
#[derive(Clone, Debug)]
pub struct RunResult {
    /// Final simulated time reached.
    pub final_time: f64,
    /// Number of steps taken.
    pub n_steps: usize,
    /// Smallest step size used.
    pub dt_min: f64,
    /// Largest step size used.
    pub dt_max: f64,
    /// Wall-clock duration of the run (s).
    pub wall_time: f64,
    /// Whether the run was ended by the cancellation flag.
    pub cancelled: bool,
    /// Snapshots recorded at `output_every` multiples.
    pub snapshots: Vec<Snapshot>,
}

/// High-level driver for a solver.
///
/// # Example
///
/// ```
/// use voellmy_rs::{Field2D, Simulation, VoellmyParams, VoellmySolver2D};
///
/// let bed = Field2D::from_fn(16, 32, |_, j| -0.1 * j as f64);
/// let mut h0 = Field2D::zeros(16, 32);
/// h0.set(8, 4, 3.0);
/// let mut solver =
///     VoellmySolver2D::new(bed, h0, 1.0, 1.0, VoellmyParams::default()).unwrap();
///
/// let result = Simulation::new()
///     .with_max_time(5.0)
///     .with_dt_max(0.1)
///     .with_output_every(10)
///     .run(&mut solver)
///     .unwrap();
/// assert!(result.final_time > 5.0 - 1e-12);
/// assert!(!result.snapshots.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Simulation {
    config: SimulationConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl Simulation {
    /// Create a driver with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver from an explicit configuration.
    pub fn from_config(config: SimulationConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Set the maximum number of steps.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = Some(max_steps);
        self
    }

    /// Set the maximum simulated time.
    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.config.max_time = max_time;
        self
    }

    /// Set the upper bound on the step size.
    pub fn with_dt_max(mut self, dt_max: f64) -> Self {
        self.config.dt_max = dt_max;
        self
    }

    /// Set the Courant number.
    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.config.cfl = Some(cfl);
        self
    }

    /// Disable CFL capping; every step uses `dt_max`.
    pub fn without_cfl(mut self) -> Self {
        self.config.cfl = None;
        self
    }

    /// Record a snapshot every `every` steps.
    pub fn with_output_every(mut self, every: usize) -> Self {
        self.config.output_every = Some(every);
        self
    }

    /// Enable progress output.
    pub fn verbose(mut self) -> Self {
        self.config.verbose = true;
        self
    }

    /// Attach a cooperative cancellation flag. It is checked before
    /// each step and before recording output; a step in flight always
    /// completes, so cancellation leaves consistent state.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Run the solver to the configured caps.
    pub fn run(&self, solver: &mut VoellmySolver2D) -> Result<RunResult, SolverError> {
        self.run_with_callback(solver, |_, _| {})
    }

    /// Run the solver, invoking `callback(time, thickness)` for every
    /// recorded snapshot.
    pub fn run_with_callback<F>(
        &self,
        solver: &mut VoellmySolver2D,
        mut callback: F,
    ) -> Result<RunResult, SolverError>
    where
        F: FnMut(f64, &Field2D),
    {
        let start_wall = std::time::Instant::now();

        let mut t = 0.0;
        let mut k: usize = 0;
        let mut dt_min_used = f64::INFINITY;
        let mut dt_max_used: f64 = 0.0;
        let mut snapshots = Vec::new();
        let mut cancelled = false;

        loop {
            if let Some(max_steps) = self.config.max_steps
                && k > max_steps
            {
                break;
            }
            if t > self.config.max_time {
                break;
            }
            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            let dt = solver.step(self.config.dt_max, self.config.cfl)?;
            t += dt;
            dt_min_used = dt_min_used.min(dt);
            dt_max_used = dt_max_used.max(dt);

            if let Some(every) = self.config.output_every
                && every > 0
                && k % every == 0
            {
                if self.is_cancelled() {
                    cancelled = true;
                    break;
                }
                let thickness = solver.thickness().clone();
                callback(t, &thickness);
                snapshots.push(Snapshot { time: t, thickness });
            }

            k += 1;

            if self.config.verbose && k % 100 == 0 {
                println!("  step {k}: t = {t:.4}, dt = {dt:.3e}");
            }
        }

        let wall_time = start_wall.elapsed().as_secs_f64();
        if self.config.verbose {
            println!(
                "run finished: {k} steps, t = {t:.4}, wall = {wall_time:.2}s, cancelled = {cancelled}"
            );
        }

        Ok(RunResult {
            final_time: t,
            n_steps: k,
            dt_min: dt_min_used,
            dt_max: dt_max_used,
            wall_time,
            cancelled,
            snapshots,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
