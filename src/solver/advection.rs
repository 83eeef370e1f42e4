//! Donor-cell advection of thickness and momentum.
//!
//! Transport is upwind in flux form. Face velocities are arithmetic
//! means of the nodal velocities on either side; the face flux of a
//! quantity `q` takes the value of `q` in the upstream cell:
//!
//! ```text
//! F[i, j+1/2] = q[upstream] * u_face[i, j+1/2]
//! q <- q - dt * (dF_x/dx + dF_y/dy)
//! ```
//!
//! Fluxes through the edges of the window are zero (closed walls), so
//! summed over the domain the update telescopes and mass is conserved
//! to machine precision.
//!
//! All four transported quantities (`h`, `uh`, `vh`, `wh`) share one
//! set of face velocities and upstream indices, computed once per step
//! from the pre-advection state.

use crate::types::Rect;

use super::H_EPS;

/// Nodal velocity from momentum and thickness, guarded against division
/// by (near-)zero thickness.
#[inline(always)]
fn nodal_velocity(momentum: f64, h: f64) -> f64 {
    momentum / h.max(H_EPS)
}

/// Face velocities on the right (`u_face`) and bottom (`v_face`) face
/// of every cell in `rect`. Faces on the right column and bottom row of
/// the window are set to zero: no flow crosses the window edge.
pub(crate) fn compute_face_velocities(
    h: &[f64],
    uh: &[f64],
    vh: &[f64],
    nx: usize,
    rect: Rect,
    u_face: &mut [f64],
    v_face: &mut [f64],
) {
    for i in rect.r0..=rect.r1 {
        face_velocity_row(h, uh, vh, nx, rect, i, u_face, v_face);
    }
}

/// Parallel variant of [`compute_face_velocities`]; rows are
/// independent, so the result is identical for any thread count.
#[cfg(feature = "parallel")]
pub(crate) fn compute_face_velocities_parallel(
    h: &[f64],
    uh: &[f64],
    vh: &[f64],
    nx: usize,
    rect: Rect,
    u_face: &mut [f64],
    v_face: &mut [f64],
) {
    use rayon::prelude::*;

    u_face
        .par_chunks_mut(nx)
        .zip(v_face.par_chunks_mut(nx))
        .enumerate()
        .filter(|(i, _)| *i >= rect.r0 && *i <= rect.r1)
        .for_each(|(i, (u_row, v_row))| {
            for j in rect.c0..=rect.c1 {
                let idx = i * nx + j;
                u_row[j] = if j < rect.c1 {
                    0.5 * (nodal_velocity(uh[idx], h[idx]) + nodal_velocity(uh[idx + 1], h[idx + 1]))
                } else {
                    0.0
                };
                v_row[j] = if i < rect.r1 {
                    0.5 * (nodal_velocity(vh[idx], h[idx])
                        + nodal_velocity(vh[idx + nx], h[idx + nx]))
                } else {
                    0.0
                };
            }
        });
}

#[inline]
fn face_velocity_row(
    h: &[f64],
    uh: &[f64],
    vh: &[f64],
    nx: usize,
    rect: Rect,
    i: usize,
    u_face: &mut [f64],
    v_face: &mut [f64],
) {
    for j in rect.c0..=rect.c1 {
        let idx = i * nx + j;
        u_face[idx] = if j < rect.c1 {
            0.5 * (nodal_velocity(uh[idx], h[idx]) + nodal_velocity(uh[idx + 1], h[idx + 1]))
        } else {
            0.0
        };
        v_face[idx] = if i < rect.r1 {
            0.5 * (nodal_velocity(vh[idx], h[idx]) + nodal_velocity(vh[idx + nx], h[idx + nx]))
        } else {
            0.0
        };
    }
}

/// Maximum of `|u_face|/dx + |v_face|/dy` over the window; the CFL
/// bound divides the Courant number by this rate.
pub(crate) fn max_courant_rate(
    u_face: &[f64],
    v_face: &[f64],
    nx: usize,
    rect: Rect,
    dx: f64,
    dy: f64,
) -> f64 {
    let mut rate: f64 = 0.0;
    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            rate = rate.max(u_face[idx].abs() / dx + v_face[idx].abs() / dy);
        }
    }
    rate
}

/// Upstream cell indices per face. For an x face the upstream column is
/// `j` when the face velocity is non-negative, `j + 1` otherwise; y
/// faces are analogous with rows.
pub(crate) fn compute_upstream_indices(
    u_face: &[f64],
    v_face: &[f64],
    nx: usize,
    rect: Rect,
    ix_up: &mut [usize],
    iy_up: &mut [usize],
) {
    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            ix_up[idx] = if u_face[idx] >= 0.0 { j } else { j + 1 };
            iy_up[idx] = if v_face[idx] >= 0.0 { i } else { i + 1 };
        }
    }
}

/// Advect one quantity with the shared face velocities and upstream
/// indices. Fluxes are materialized first so the in-place update reads
/// only pre-step values.
pub(crate) fn advect_quantity(
    q: &mut [f64],
    u_face: &[f64],
    v_face: &[f64],
    ix_up: &[usize],
    iy_up: &[usize],
    flux_x: &mut [f64],
    flux_y: &mut [f64],
    nx: usize,
    rect: Rect,
    dx: f64,
    dy: f64,
    dt: f64,
) {
    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            flux_x[idx] = q[i * nx + ix_up[idx]] * u_face[idx];
            flux_y[idx] = q[iy_up[idx] * nx + j] * v_face[idx];
        }
    }

    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            // Zero-flux padding on the left/top window edges.
            let fx_left = if j > rect.c0 { flux_x[idx - 1] } else { 0.0 };
            let fy_top = if i > rect.r0 { flux_y[idx - nx] } else { 0.0 };
            q[idx] -= dt * ((flux_x[idx] - fx_left) / dx + (flux_y[idx] - fy_top) / dy);
        }
    }
}
