//! The finite-volume solver: state, step orchestration, kernels.
//!
//! [`VoellmySolver2D`] owns the mobile-layer state (thickness and three
//! momentum components per unit area) over an immutable
//! [`Terrain2D`](crate::terrain::Terrain2D). One call to
//! [`VoellmySolver2D::step`] advances the state by one CFL-bounded time
//! step through a fixed sequence of phases:
//!
//! 1. locate the active rectangle (cells above the motion threshold
//!    plus a two-cell halo);
//! 2. face velocities and the CFL bound on `dt`;
//! 3. donor-cell advection of `h`, `uh`, `vh`, `wh`;
//! 4. bed-plane reprojection of momentum (centripetal correction);
//! 5. thickness-weighted free-surface gradient;
//! 6. pressure-gradient acceleration;
//! 7. two-regime friction update, stopping rule, regime flags.
//!
//! The order is load-bearing: the reprojection needs pre-pressure
//! momentum, the gradient needs post-advection thickness, and the
//! friction update reuses the centripetal term of phase 4 and the
//! pressure of phase 6.
//!
//! A non-finite value in the state after a step latches the solver into
//! a diverged state; further calls to `step` fail with the same error.

mod active;
mod advection;
pub mod diagnostics;
mod friction;
mod gradient;
mod params;
mod pressure;
mod projection;
mod workspace;

pub use params::VoellmyParams;

use crate::error::SolverError;
use crate::terrain::Terrain2D;
use crate::types::{Field2D, FlowRegime, Rect};

use workspace::Workspace;

/// Numerical floor guarding divisions by thickness (m).
pub const H_EPS: f64 = 1e-10;

/// Halo added around the tight bounding box of moving cells.
pub(crate) const ACTIVE_HALO: usize = 2;

/// Window size below which the parallel kernels are not worth the
/// fork-join overhead.
#[cfg(feature = "parallel")]
const PAR_MIN_CELLS: usize = 4096;

/// Two-dimensional finite-volume solver for gravity-driven mass flows
/// with the modified Voellmy rheology.
///
/// # Example
///
/// ```
/// use voellmy_rs::{Field2D, VoellmyParams, VoellmySolver2D};
///
/// // A 10% incline with a square release pile.
/// let bed = Field2D::from_fn(32, 64, |_, j| -0.1 * j as f64);
/// let mut h0 = Field2D::zeros(32, 64);
/// for i in 14..18 {
///     for j in 4..8 {
///         h0.set(i, j, 2.0);
///     }
/// }
///
/// let mut solver =
///     VoellmySolver2D::new(bed, h0, 1.0, 1.0, VoellmyParams::default()).unwrap();
/// let dt = solver.step(0.5, Some(0.7)).unwrap();
/// assert!(dt > 0.0 && dt <= 0.5);
/// ```
pub struct VoellmySolver2D {
    terrain: Terrain2D,
    params: VoellmyParams,
    h: Field2D,
    uh: Field2D,
    vh: Field2D,
    wh: Field2D,
    stat: Vec<FlowRegime>,
    ws: Workspace,
    n_steps: usize,
    diverged: Option<usize>,
}

impl VoellmySolver2D {
    /// Create a solver from bed elevation, initial thickness, cell
    /// sizes and parameters. Momentum initializes to zero.
    pub fn new(
        bed: Field2D,
        h0: Field2D,
        dx: f64,
        dy: f64,
        params: VoellmyParams,
    ) -> Result<Self, SolverError> {
        if !bed.same_shape(&h0) {
            return Err(SolverError::ShapeMismatch {
                bed_ny: bed.ny(),
                bed_nx: bed.nx(),
                h_ny: h0.ny(),
                h_nx: h0.nx(),
            });
        }
        let terrain = Terrain2D::new(bed, dx, dy)?;
        Self::from_terrain(terrain, h0, params)
    }

    /// Create a solver over an existing terrain.
    pub fn from_terrain(
        terrain: Terrain2D,
        h0: Field2D,
        params: VoellmyParams,
    ) -> Result<Self, SolverError> {
        let (ny, nx) = terrain.shape();
        if h0.shape() != (ny, nx) {
            return Err(SolverError::ShapeMismatch {
                bed_ny: ny,
                bed_nx: nx,
                h_ny: h0.ny(),
                h_nx: h0.nx(),
            });
        }
        params.validate(ny, nx)?;
        if h0.min() < 0.0 {
            return Err(SolverError::InvalidParameter(format!(
                "initial thickness must be non-negative, got {}",
                h0.min()
            )));
        }

        let n = ny * nx;
        Ok(Self {
            terrain,
            params,
            h: h0,
            uh: Field2D::zeros(ny, nx),
            vh: Field2D::zeros(ny, nx),
            wh: Field2D::zeros(ny, nx),
            stat: vec![FlowRegime::Stopped; n],
            ws: Workspace::new(n),
            n_steps: 0,
            diverged: None,
        })
    }

    /// Advance the state by one time step.
    ///
    /// `dt_max` bounds the step from above; with `cfl` supplied the step
    /// is further bounded by `cfl / max(|u_f|/dx + |v_f|/dy)` over the
    /// active rectangle. Returns the `dt` actually used. With no cell
    /// above the motion threshold the step is a no-op and returns
    /// `dt_max`.
    pub fn step(&mut self, dt_max: f64, cfl: Option<f64>) -> Result<f64, SolverError> {
        if let Some(step) = self.diverged {
            return Err(SolverError::Diverged { step });
        }
        if !(dt_max > 0.0) {
            return Err(SolverError::InvalidTimeStep(dt_max));
        }
        if let Some(c) = cfl
            && !(c > 0.0 && c <= 1.0)
        {
            return Err(SolverError::InvalidCfl(c));
        }

        let Some(rect) = active_rect_of(&self.h, &self.params, ACTIVE_HALO) else {
            self.n_steps += 1;
            return Ok(dt_max);
        };

        let nx = self.h.nx();
        let dx = self.terrain.dx();
        let dy = self.terrain.dy();

        // Face velocities from the pre-advection state.
        #[cfg(feature = "parallel")]
        if rect.n_cells() >= PAR_MIN_CELLS {
            advection::compute_face_velocities_parallel(
                self.h.as_slice(),
                self.uh.as_slice(),
                self.vh.as_slice(),
                nx,
                rect,
                &mut self.ws.u_face,
                &mut self.ws.v_face,
            );
        } else {
            advection::compute_face_velocities(
                self.h.as_slice(),
                self.uh.as_slice(),
                self.vh.as_slice(),
                nx,
                rect,
                &mut self.ws.u_face,
                &mut self.ws.v_face,
            );
        }
        #[cfg(not(feature = "parallel"))]
        advection::compute_face_velocities(
            self.h.as_slice(),
            self.uh.as_slice(),
            self.vh.as_slice(),
            nx,
            rect,
            &mut self.ws.u_face,
            &mut self.ws.v_face,
        );

        let mut dt = dt_max;
        if let Some(c) = cfl {
            let rate = advection::max_courant_rate(&self.ws.u_face, &self.ws.v_face, nx, rect, dx, dy);
            if rate > 0.0 {
                dt = dt.min(c / rate);
            }
        }

        // Donor-cell advection; all four quantities share the upstream
        // indices and face velocities.
        advection::compute_upstream_indices(
            &self.ws.u_face,
            &self.ws.v_face,
            nx,
            rect,
            &mut self.ws.ix_up,
            &mut self.ws.iy_up,
        );
        for q in [&mut self.h, &mut self.uh, &mut self.vh, &mut self.wh] {
            advection::advect_quantity(
                q.as_mut_slice(),
                &self.ws.u_face,
                &self.ws.v_face,
                &self.ws.ix_up,
                &self.ws.iy_up,
                &mut self.ws.flux_x,
                &mut self.ws.flux_y,
                nx,
                rect,
                dx,
                dy,
                dt,
            );
        }

        // Centripetal correction; hcdt feeds the friction phase.
        projection::project_to_bed(
            self.uh.as_mut_slice(),
            self.vh.as_mut_slice(),
            self.wh.as_mut_slice(),
            self.terrain.dbdx().as_slice(),
            self.terrain.dbdy().as_slice(),
            self.terrain.cos_beta().as_slice(),
            &mut self.ws.hcdt,
            nx,
            rect,
        );

        // Free-surface gradient from the post-advection thickness.
        gradient::surface_gradient_x(
            self.h.as_slice(),
            self.terrain.bed().as_slice(),
            nx,
            rect,
            dx,
            &mut self.ws.dsdx,
        );
        gradient::surface_gradient_y(
            self.h.as_slice(),
            self.terrain.bed().as_slice(),
            nx,
            rect,
            dy,
            &mut self.ws.dsdy,
        );

        pressure::apply_pressure(
            self.h.as_slice(),
            self.uh.as_mut_slice(),
            self.vh.as_mut_slice(),
            self.wh.as_mut_slice(),
            &self.ws.dsdx,
            &self.ws.dsdy,
            self.terrain.dbdx().as_slice(),
            self.terrain.dbdy().as_slice(),
            self.terrain.cos_beta().as_slice(),
            &mut self.ws.pressure,
            nx,
            rect,
            self.params.d_min,
            self.params.g,
            dt,
        );

        // Regime flags are rebuilt every step; outside the active
        // rectangle everything is stopped.
        self.stat.fill(FlowRegime::Stopped);
        #[cfg(feature = "parallel")]
        if rect.n_cells() >= PAR_MIN_CELLS {
            friction::apply_friction_parallel(
                self.h.as_slice(),
                self.uh.as_mut_slice(),
                self.vh.as_mut_slice(),
                self.wh.as_mut_slice(),
                &mut self.stat,
                &self.ws.pressure,
                &self.ws.hcdt,
                self.terrain.cos_beta().as_slice(),
                &self.params,
                nx,
                rect,
                dt,
            );
        } else {
            friction::apply_friction(
                self.h.as_slice(),
                self.uh.as_mut_slice(),
                self.vh.as_mut_slice(),
                self.wh.as_mut_slice(),
                &mut self.stat,
                &self.ws.pressure,
                &self.ws.hcdt,
                self.terrain.cos_beta().as_slice(),
                &self.params,
                nx,
                rect,
                dt,
            );
        }
        #[cfg(not(feature = "parallel"))]
        friction::apply_friction(
            self.h.as_slice(),
            self.uh.as_mut_slice(),
            self.vh.as_mut_slice(),
            self.wh.as_mut_slice(),
            &mut self.stat,
            &self.ws.pressure,
            &self.ws.hcdt,
            self.terrain.cos_beta().as_slice(),
            &self.params,
            nx,
            rect,
            dt,
        );

        let finite = diagnostics::rect_is_finite(
            &[
                self.h.as_slice(),
                self.uh.as_slice(),
                self.vh.as_slice(),
                self.wh.as_slice(),
            ],
            nx,
            rect,
        );
        if !finite {
            self.diverged = Some(self.n_steps);
            return Err(SolverError::Diverged { step: self.n_steps });
        }

        self.n_steps += 1;
        Ok(dt)
    }

    /// Mobile-layer thickness (m).
    #[inline]
    pub fn thickness(&self) -> &Field2D {
        &self.h
    }

    /// Momentum per unit area along x (m^2/s).
    #[inline]
    pub fn momentum_x(&self) -> &Field2D {
        &self.uh
    }

    /// Momentum per unit area along y (m^2/s).
    #[inline]
    pub fn momentum_y(&self) -> &Field2D {
        &self.vh
    }

    /// Momentum per unit area along z (m^2/s).
    #[inline]
    pub fn momentum_z(&self) -> &Field2D {
        &self.wh
    }

    /// Per-cell flow regime after the last step, row-major.
    #[inline]
    pub fn regimes(&self) -> &[FlowRegime] {
        &self.stat
    }

    /// Flow regime of cell `(i, j)`.
    #[inline]
    pub fn regime_at(&self, i: usize, j: usize) -> FlowRegime {
        self.stat[self.h.idx(i, j)]
    }

    /// Terrain the solver runs over.
    #[inline]
    pub fn terrain(&self) -> &Terrain2D {
        &self.terrain
    }

    /// Model parameters.
    #[inline]
    pub fn params(&self) -> &VoellmyParams {
        &self.params
    }

    /// Grid shape as `(ny, nx)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.h.shape()
    }

    /// Number of completed steps.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Whether a previous step produced non-finite state.
    #[inline]
    pub fn has_diverged(&self) -> bool {
        self.diverged.is_some()
    }

    /// Current active rectangle, if any cell is above the threshold.
    pub fn active_rect(&self) -> Option<Rect> {
        active_rect_of(&self.h, &self.params, ACTIVE_HALO)
    }

    /// Total mass proxy `sum(h) dx dy`.
    pub fn total_mass(&self) -> f64 {
        diagnostics::total_mass(&self.h, self.terrain.dx(), self.terrain.dy())
    }

    /// Total momentum magnitude over the domain.
    pub fn total_momentum(&self) -> f64 {
        diagnostics::total_momentum(
            &self.uh,
            &self.vh,
            &self.wh,
            self.terrain.dx(),
            self.terrain.dy(),
        )
    }

    /// Largest horizontal speed over the domain.
    pub fn max_speed(&self) -> f64 {
        diagnostics::max_speed(&self.h, &self.uh, &self.vh)
    }

    /// Number of cells above the motion threshold.
    pub fn active_cell_count(&self) -> usize {
        diagnostics::active_cell_count(&self.h, &self.params.h_min)
    }
}

fn active_rect_of(h: &Field2D, params: &VoellmyParams, halo: usize) -> Option<Rect> {
    active::active_rect(h, &params.h_min, halo)
}
