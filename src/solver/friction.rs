//! Two-regime friction update and stopping rule.
//!
//! Each moving cell dissipates momentum through one of two laws:
//!
//! - **Voellmy** (turbulent): deceleration proportional to the squared
//!   velocity. Integrated implicitly over the step via
//!   `M_new = sqrt(f^2 + 2 f M) - f` with `f = xi h^2 cos(beta) / (2 g dt)`,
//!   which is unconditionally stable and cannot overshoot past zero.
//! - **Coulomb** (dry): rate-independent deceleration proportional to
//!   the effective normal pressure; the maximum dissipation over the
//!   step is subtracted and clamped at zero.
//!
//! With a positive crossover velocity `v_c` a cell is Voellmy iff
//! `M >= v_c h (h cos beta)^(1/3)` and Coulomb otherwise (the modified
//! rheology of Hergarten, 2024). With `v_c <= 0` both laws act in
//! sequence on every moving cell, recovering the conventional Voellmy
//! model; the reported regime flag then distinguishes which term
//! dominates via `M_new^2 > mu p xi h^2 / g`.
//!
//! When the centripetal term is enabled, the normal pressure is
//! augmented by the momentum the bed-plane projection removed this
//! step, `max(p + hcdt cos(beta) / dt, 0)`: flow forced around a
//! concave bend presses harder on the bed.
//!
//! Cells at or below the motion threshold, and cells whose updated
//! magnitude is non-positive, stop: momentum is zeroed and the flag set
//! to [`FlowRegime::Stopped`].

use crate::types::{FlowRegime, Rect};

use super::H_EPS;
use super::params::VoellmyParams;

/// Apply the friction update to momentum and set the per-cell regime
/// flags. `pressure` and `hcdt` come from the pressure and projection
/// phases of the same step.
#[allow(clippy::too_many_arguments)]
pub(crate) fn apply_friction(
    h: &[f64],
    uh: &mut [f64],
    vh: &mut [f64],
    wh: &mut [f64],
    stat: &mut [FlowRegime],
    pressure: &[f64],
    hcdt: &[f64],
    cos_beta: &[f64],
    params: &VoellmyParams,
    nx: usize,
    rect: Rect,
    dt: f64,
) {
    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            friction_cell(
                h, uh, vh, wh, stat, pressure, hcdt, cos_beta, params, idx, dt,
            );
        }
    }
}

/// Parallel variant of [`apply_friction`]; the update is per-cell, so
/// the result is identical for any thread count.
#[cfg(feature = "parallel")]
#[allow(clippy::too_many_arguments)]
pub(crate) fn apply_friction_parallel(
    h: &[f64],
    uh: &mut [f64],
    vh: &mut [f64],
    wh: &mut [f64],
    stat: &mut [FlowRegime],
    pressure: &[f64],
    hcdt: &[f64],
    cos_beta: &[f64],
    params: &VoellmyParams,
    nx: usize,
    rect: Rect,
    dt: f64,
) {
    use rayon::prelude::*;

    uh.par_chunks_mut(nx)
        .zip(vh.par_chunks_mut(nx))
        .zip(wh.par_chunks_mut(nx))
        .zip(stat.par_chunks_mut(nx))
        .enumerate()
        .filter(|(i, _)| *i >= rect.r0 && *i <= rect.r1)
        .for_each(|(i, (((uh_row, vh_row), wh_row), stat_row))| {
            let row = i * nx;
            for j in rect.c0..=rect.c1 {
                let idx = row + j;
                let (m, m_new, regime) = friction_magnitude(
                    h[idx],
                    uh_row[j],
                    vh_row[j],
                    wh_row[j],
                    pressure[idx],
                    hcdt[idx],
                    cos_beta[idx],
                    params,
                    idx,
                    dt,
                );
                let scale = m_new / m.max(H_EPS);
                uh_row[j] *= scale;
                vh_row[j] *= scale;
                wh_row[j] *= scale;
                stat_row[j] = regime;
            }
        });
}

#[inline]
#[allow(clippy::too_many_arguments)]
fn friction_cell(
    h: &[f64],
    uh: &mut [f64],
    vh: &mut [f64],
    wh: &mut [f64],
    stat: &mut [FlowRegime],
    pressure: &[f64],
    hcdt: &[f64],
    cos_beta: &[f64],
    params: &VoellmyParams,
    idx: usize,
    dt: f64,
) {
    let (m, m_new, regime) = friction_magnitude(
        h[idx],
        uh[idx],
        vh[idx],
        wh[idx],
        pressure[idx],
        hcdt[idx],
        cos_beta[idx],
        params,
        idx,
        dt,
    );
    let scale = m_new / m.max(H_EPS);
    uh[idx] *= scale;
    vh[idx] *= scale;
    wh[idx] *= scale;
    stat[idx] = regime;
}

/// Updated momentum magnitude and regime flag for one cell.
///
/// Returns `(m_before, m_after, regime)`; the caller rescales the
/// momentum vector by `m_after / max(m_before, eps)`.
#[inline]
#[allow(clippy::too_many_arguments)]
fn friction_magnitude(
    h: f64,
    uh: f64,
    vh: f64,
    wh: f64,
    pressure: f64,
    hcdt: f64,
    cos_beta: f64,
    params: &VoellmyParams,
    idx: usize,
    dt: f64,
) -> (f64, f64, FlowRegime) {
    let m = (uh * uh + vh * vh + wh * wh).sqrt();

    let mut p = pressure;
    if params.centripetal {
        p = (p + hcdt * cos_beta / dt).max(0.0);
    }

    let mu = params.mu.at(idx);
    let xi = params.xi.at(idx);
    let v_c = params.v_crossover.at(idx);
    let h_min = params.h_min.at(idx);

    let moving = h > h_min;
    // Crossover test of the modified rheology; cbrt is exact for the
    // non-negative arguments that occur here.
    let crossover = m >= v_c * h * (h * cos_beta).cbrt();

    let mut m_new = m;
    if moving {
        if v_c <= 0.0 || crossover {
            let f = xi * h * h * cos_beta / (2.0 * params.g * dt);
            m_new = ((f * f + 2.0 * f * m_new).sqrt() - f).max(0.0);
        }
        if v_c <= 0.0 || !crossover {
            m_new = (m_new - mu * p / cos_beta * dt).max(0.0);
        }
    }

    let regime = if !moving || m_new <= 0.0 {
        m_new = 0.0;
        FlowRegime::Stopped
    } else if v_c > 0.0 {
        if crossover {
            FlowRegime::Voellmy
        } else {
            FlowRegime::Coulomb
        }
    } else if m_new * m_new > mu * p * xi * h * h / params.g {
        FlowRegime::Voellmy
    } else {
        FlowRegime::Coulomb
    };

    (m, m_new, regime)
}
