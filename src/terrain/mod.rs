//! Bed geometry: elevation, slopes, and the bed-normal cosine.
//!
//! The bed is a rigid surface `b(x, y)` sampled on the grid. Its
//! central-difference slopes and the bed-normal cosine
//!
//! ```text
//! cos beta = 1 / sqrt(1 + (db/dx)^2 + (db/dy)^2)
//! ```
//!
//! enter the momentum projection, the pressure model, and the friction
//! update every step, so they are computed once at construction and held
//! immutable.
//!
//! The domain is closed by reflective walls: a gradient stencil that
//! reaches past the edge reads the mirrored interior cell instead
//! (`-1 -> 1`, `n -> n-2`). In particular the bed slope normal to a wall
//! is zero, which is what makes the walls impermeable together with the
//! zeroed edge fluxes in the advection kernel.

use crate::error::SolverError;
use crate::types::Field2D;

/// Mirror an out-of-range stencil index back into `[0, n)`.
///
/// Positions `-1` and `n` map to `1` and `n - 2`; in-range indices pass
/// through unchanged. Centralizes the reflective-boundary convention so
/// no kernel does ad-hoc index arithmetic at the walls.
#[inline]
pub fn mirror_index(idx: isize, n: usize) -> usize {
    if idx < 0 {
        (-idx) as usize
    } else if idx as usize >= n {
        2 * n - 2 - idx as usize
    } else {
        idx as usize
    }
}

/// Immutable bed geometry shared by all step kernels.
#[derive(Clone, Debug)]
pub struct Terrain2D {
    bed: Field2D,
    dbdx: Field2D,
    dbdy: Field2D,
    cos_beta: Field2D,
    dx: f64,
    dy: f64,
}

impl Terrain2D {
    /// Build the geometry from a bed elevation field and cell sizes.
    ///
    /// Fails if `dx` or `dy` is not strictly positive or the grid is
    /// smaller than 2x2 (the mirror stencil needs two cells per axis).
    pub fn new(bed: Field2D, dx: f64, dy: f64) -> Result<Self, SolverError> {
        if !(dx > 0.0) || !(dy > 0.0) {
            return Err(SolverError::InvalidCellSize { dx, dy });
        }
        let (ny, nx) = bed.shape();
        if ny < 2 || nx < 2 {
            return Err(SolverError::InvalidParameter(format!(
                "grid must be at least 2x2, got {ny}x{nx}"
            )));
        }

        let mut dbdx = Field2D::zeros(ny, nx);
        let mut dbdy = Field2D::zeros(ny, nx);
        let mut cos_beta = Field2D::zeros(ny, nx);

        for i in 0..ny {
            for j in 0..nx {
                let jm = mirror_index(j as isize - 1, nx);
                let jp = mirror_index(j as isize + 1, nx);
                let im = mirror_index(i as isize - 1, ny);
                let ip = mirror_index(i as isize + 1, ny);

                let sx = (bed.at(i, jp) - bed.at(i, jm)) / (2.0 * dx);
                let sy = (bed.at(ip, j) - bed.at(im, j)) / (2.0 * dy);
                dbdx.set(i, j, sx);
                dbdy.set(i, j, sy);
                cos_beta.set(i, j, 1.0 / (1.0 + sx * sx + sy * sy).sqrt());
            }
        }

        Ok(Self {
            bed,
            dbdx,
            dbdy,
            cos_beta,
            dx,
            dy,
        })
    }

    /// Bed elevation field.
    #[inline]
    pub fn bed(&self) -> &Field2D {
        &self.bed
    }

    /// Bed slope in the x direction.
    #[inline]
    pub fn dbdx(&self) -> &Field2D {
        &self.dbdx
    }

    /// Bed slope in the y direction.
    #[inline]
    pub fn dbdy(&self) -> &Field2D {
        &self.dbdy
    }

    /// Bed-normal cosine, in `(0, 1]`.
    #[inline]
    pub fn cos_beta(&self) -> &Field2D {
        &self.cos_beta
    }

    /// Cell size in x (m).
    #[inline]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// Cell size in y (m).
    #[inline]
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Grid shape as `(ny, nx)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.bed.shape()
    }
}
