//! Material and model parameters for the modified Voellmy rheology.
//!
//! The rheology blends dry Coulomb friction with turbulent Voellmy
//! friction, selected per cell by a crossover velocity that scales with
//! `(h cos beta)^(1/3)` (Hergarten, 2024). Setting the crossover
//! velocity to a non-positive value recovers the conventional Voellmy
//! model in which both friction terms act together.
//!
//! Friction parameters may vary per cell (see [`SpatialParam`]), which
//! is how surveys encode different surface classes along a track.

use crate::error::SolverError;
use crate::types::SpatialParam;

/// Parameters of the modified Voellmy rheology.
///
/// # Example
///
/// ```
/// use voellmy_rs::VoellmyParams;
///
/// // Rock-avalanche setup: rougher bed, no motion below 5 cm.
/// let params = VoellmyParams::default()
///     .with_mu(0.25)
///     .with_xi(400.0)
///     .with_h_min(0.05);
/// ```
#[derive(Clone, Debug)]
pub struct VoellmyParams {
    /// Coulomb friction coefficient mu (dimensionless).
    pub mu: SpatialParam,
    /// Voellmy bed-roughness parameter xi (m/s^2).
    pub xi: SpatialParam,
    /// Crossover velocity at unit thickness (m/s). Non-positive values
    /// select the conventional Voellmy model (no crossover).
    pub v_crossover: SpatialParam,
    /// Motion threshold on thickness (m); thinner cells never move.
    pub h_min: SpatialParam,
    /// Pressure-denominator floor. Zero (the default) selects the
    /// modified pressure `g h cos^2 beta`; positive values select the
    /// original denominator-limited pressure.
    pub d_min: f64,
    /// Include the centripetal term in the effective normal pressure.
    pub centripetal: bool,
    /// Gravitational acceleration (m/s^2).
    pub g: f64,
}

impl Default for VoellmyParams {
    fn default() -> Self {
        Self {
            mu: SpatialParam::Uniform(0.2),
            xi: SpatialParam::Uniform(500.0),
            v_crossover: SpatialParam::Uniform(4.0),
            h_min: SpatialParam::Uniform(0.0),
            d_min: 0.0,
            centripetal: true,
            g: 9.81,
        }
    }
}

impl VoellmyParams {
    /// Set the Coulomb friction coefficient (scalar or per-cell).
    pub fn with_mu(mut self, mu: impl Into<SpatialParam>) -> Self {
        self.mu = mu.into();
        self
    }

    /// Set the Voellmy bed-roughness parameter (scalar or per-cell).
    pub fn with_xi(mut self, xi: impl Into<SpatialParam>) -> Self {
        self.xi = xi.into();
        self
    }

    /// Set the crossover velocity (scalar or per-cell).
    pub fn with_v_crossover(mut self, v_c: impl Into<SpatialParam>) -> Self {
        self.v_crossover = v_c.into();
        self
    }

    /// Set the motion threshold (scalar or per-cell).
    pub fn with_h_min(mut self, h_min: impl Into<SpatialParam>) -> Self {
        self.h_min = h_min.into();
        self
    }

    /// Set the pressure-denominator floor (selects the pressure model).
    pub fn with_d_min(mut self, d_min: f64) -> Self {
        self.d_min = d_min;
        self
    }

    /// Enable or disable the centripetal pressure contribution.
    pub fn with_centripetal(mut self, centripetal: bool) -> Self {
        self.centripetal = centripetal;
        self
    }

    /// Set the gravitational acceleration.
    pub fn with_g(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    /// Validate ranges and per-cell field shapes against the grid.
    pub fn validate(&self, ny: usize, nx: usize) -> Result<(), SolverError> {
        self.mu.check_shape("mu", ny, nx)?;
        self.xi.check_shape("xi", ny, nx)?;
        self.v_crossover.check_shape("v_crossover", ny, nx)?;
        self.h_min.check_shape("h_min", ny, nx)?;

        if self.h_min.min() < 0.0 {
            return Err(SolverError::InvalidParameter(format!(
                "h_min must be non-negative, got {}",
                self.h_min.min()
            )));
        }
        if !(self.g > 0.0) {
            return Err(SolverError::InvalidParameter(format!(
                "g must be positive, got {}",
                self.g
            )));
        }
        if self.d_min < 0.0 {
            return Err(SolverError::InvalidParameter(format!(
                "d_min must be non-negative, got {}",
                self.d_min
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field2D;

    #[test]
    fn test_defaults() {
        let p = VoellmyParams::default();
        assert_eq!(p.mu.at(0), 0.2);
        assert_eq!(p.xi.at(0), 500.0);
        assert_eq!(p.v_crossover.at(0), 4.0);
        assert_eq!(p.h_min.at(0), 0.0);
        assert_eq!(p.d_min, 0.0);
        assert!(p.centripetal);
        assert_eq!(p.g, 9.81);
        assert!(p.validate(10, 10).is_ok());
    }

    #[test]
    fn test_builders() {
        let p = VoellmyParams::default()
            .with_mu(0.3)
            .with_xi(250.0)
            .with_v_crossover(-1.0)
            .with_h_min(0.01)
            .with_d_min(0.2)
            .with_centripetal(false)
            .with_g(9.80665);
        assert_eq!(p.mu.at(5), 0.3);
        assert_eq!(p.xi.at(5), 250.0);
        assert_eq!(p.v_crossover.at(5), -1.0);
        assert_eq!(p.h_min.at(5), 0.01);
        assert_eq!(p.d_min, 0.2);
        assert!(!p.centripetal);
        assert!(p.validate(3, 3).is_ok());
    }

    #[test]
    fn test_per_cell_mu() {
        let mu = Field2D::from_fn(4, 4, |i, _| if i < 2 { 0.1 } else { 0.3 });
        let p = VoellmyParams::default().with_mu(mu);
        assert_eq!(p.mu.at(0), 0.1);
        assert_eq!(p.mu.at(3 * 4), 0.3);
        assert!(p.validate(4, 4).is_ok());
        assert!(p.validate(5, 5).is_err());
    }

    #[test]
    fn test_rejects_bad_ranges() {
        assert!(VoellmyParams::default().with_h_min(-0.1).validate(4, 4).is_err());
        assert!(VoellmyParams::default().with_g(0.0).validate(4, 4).is_err());
        assert!(VoellmyParams::default().with_g(-9.81).validate(4, 4).is_err());
        assert!(VoellmyParams::default().with_d_min(-1.0).validate(4, 4).is_err());
    }
}
