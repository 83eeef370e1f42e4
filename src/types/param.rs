//! Scalar-or-per-cell material parameters.
//!
//! Friction parameters are usually uniform over the domain, but surveys
//! of real events often calibrate them per surface class (forest, scree,
//! channel). `SpatialParam` carries both forms behind a single per-cell
//! getter so the step kernels take one code path.

use crate::error::SolverError;
use crate::types::Field2D;

/// A material parameter given either as one scalar or as a per-cell field.
#[derive(Clone, Debug, PartialEq)]
pub enum SpatialParam {
    /// One value for the whole domain.
    Uniform(f64),
    /// One value per grid cell, shape `[ny, nx]`.
    PerCell(Field2D),
}

impl SpatialParam {
    /// Value at the flat cell index `idx`.
    #[inline(always)]
    pub fn at(&self, idx: usize) -> f64 {
        match self {
            SpatialParam::Uniform(v) => *v,
            SpatialParam::PerCell(f) => f.as_slice()[idx],
        }
    }

    /// Smallest value over the domain.
    pub fn min(&self) -> f64 {
        match self {
            SpatialParam::Uniform(v) => *v,
            SpatialParam::PerCell(f) => f.min(),
        }
    }

    /// Check that a per-cell field matches the grid shape.
    pub fn check_shape(&self, name: &str, ny: usize, nx: usize) -> Result<(), SolverError> {
        match self {
            SpatialParam::Uniform(_) => Ok(()),
            SpatialParam::PerCell(f) if f.shape() == (ny, nx) => Ok(()),
            SpatialParam::PerCell(f) => Err(SolverError::InvalidParameter(format!(
                "{name} field is {}x{}, grid is {ny}x{nx}",
                f.ny(),
                f.nx()
            ))),
        }
    }
}

impl From<f64> for SpatialParam {
    fn from(v: f64) -> Self {
        SpatialParam::Uniform(v)
    }
}

impl From<Field2D> for SpatialParam {
    fn from(f: Field2D) -> Self {
        SpatialParam::PerCell(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_at() {
        let p = SpatialParam::from(0.25);
        assert_eq!(p.at(0), 0.25);
        assert_eq!(p.at(99), 0.25);
        assert_eq!(p.min(), 0.25);
    }

    #[test]
    fn test_per_cell_at() {
        let f = Field2D::from_fn(2, 2, |i, j| (i + j) as f64);
        let p = SpatialParam::from(f);
        assert_eq!(p.at(0), 0.0);
        assert_eq!(p.at(3), 2.0);
        assert_eq!(p.min(), 0.0);
    }

    #[test]
    fn test_check_shape() {
        let p = SpatialParam::from(Field2D::zeros(3, 4));
        assert!(p.check_shape("mu", 3, 4).is_ok());
        assert!(p.check_shape("mu", 4, 3).is_err());
        assert!(SpatialParam::from(1.0).check_shape("mu", 7, 7).is_ok());
    }
}
