//! Conservation and stability diagnostics.
//!
//! Cheap reductions over the state, used by the tests to pin the
//! conservation properties and by the solver to detect divergence at
//! the end of a step.

use crate::types::{Field2D, Rect, SpatialParam};

use super::H_EPS;

/// Total mass proxy `sum(h) dx dy` (m^3).
pub fn total_mass(h: &Field2D, dx: f64, dy: f64) -> f64 {
    h.sum() * dx * dy
}

/// Total momentum magnitude `sum(sqrt(uh^2 + vh^2 + wh^2)) dx dy`.
pub fn total_momentum(uh: &Field2D, vh: &Field2D, wh: &Field2D, dx: f64, dy: f64) -> f64 {
    let u = uh.as_slice();
    let v = vh.as_slice();
    let w = wh.as_slice();
    let mut sum = 0.0;
    for k in 0..u.len() {
        sum += (u[k] * u[k] + v[k] * v[k] + w[k] * w[k]).sqrt();
    }
    sum * dx * dy
}

/// Largest horizontal speed `sqrt(u^2 + v^2)` over the domain.
pub fn max_speed(h: &Field2D, uh: &Field2D, vh: &Field2D) -> f64 {
    let hs = h.as_slice();
    let us = uh.as_slice();
    let vs = vh.as_slice();
    let mut speed: f64 = 0.0;
    for k in 0..hs.len() {
        let inv = 1.0 / hs[k].max(H_EPS);
        let u = us[k] * inv;
        let v = vs[k] * inv;
        speed = speed.max((u * u + v * v).sqrt());
    }
    speed
}

/// Number of cells above the motion threshold.
pub fn active_cell_count(h: &Field2D, h_min: &SpatialParam) -> usize {
    h.as_slice()
        .iter()
        .enumerate()
        .filter(|(k, v)| **v > h_min.at(*k))
        .count()
}

/// Whether every value of every field is finite inside the window.
pub(crate) fn rect_is_finite(fields: &[&[f64]], nx: usize, rect: Rect) -> bool {
    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            for f in fields {
                if !f[idx].is_finite() {
                    return false;
                }
            }
        }
    }
    true
}
