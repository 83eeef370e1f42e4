//! Pressure model and pressure-gradient acceleration.
//!
//! Two pressure closures, selected by the `d_min` parameter:
//!
//! - `d_min = 0` (default): the modified pressure `p = g h cos^2 beta`,
//!   which stays bounded on steep terrain.
//! - `d_min > 0`: the original pressure `p = g h / max(1 + s., d_min)`
//!   with `s. = (ds/dx)(db/dx) + (ds/dy)(db/dy)`. Near the floor the
//!   denominator produces large pressures; the mode is kept for
//!   comparison runs, not recommended.
//!
//! The momentum update applies the pressure gradient to all three
//! components, keeping the force parallel to the free surface:
//!
//! ```text
//! uh -= dt p ds/dx,   vh -= dt p ds/dy,   wh -= dt p s.
//! ```
//!
//! `p` is stored in the workspace; the friction phase reuses it as the
//! base of its effective normal pressure.

use crate::types::Rect;

/// Compute pressure, apply the pressure-gradient acceleration, and
/// store the pressure for the friction phase.
#[allow(clippy::too_many_arguments)]
pub(crate) fn apply_pressure(
    h: &[f64],
    uh: &mut [f64],
    vh: &mut [f64],
    wh: &mut [f64],
    dsdx: &[f64],
    dsdy: &[f64],
    dbdx: &[f64],
    dbdy: &[f64],
    cos_beta: &[f64],
    pressure: &mut [f64],
    nx: usize,
    rect: Rect,
    d_min: f64,
    g: f64,
    dt: f64,
) {
    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            let sd = dsdx[idx] * dbdx[idx] + dsdy[idx] * dbdy[idx];

            let p = if d_min > 0.0 {
                g * h[idx] / (1.0 + sd).max(d_min)
            } else {
                let cb = cos_beta[idx];
                g * h[idx] * cb * cb
            };
            pressure[idx] = p;

            uh[idx] -= dt * p * dsdx[idx];
            vh[idx] -= dt * p * dsdy[idx];
            wh[idx] -= dt * p * sd;
        }
    }
}
