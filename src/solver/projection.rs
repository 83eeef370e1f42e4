//! Bed-plane reprojection of momentum (centripetal correction).
//!
//! Advection treats the three momentum components independently, so the
//! momentum vector drifts off the local bed tangent plane wherever the
//! bed curves. This phase rotates it back onto the plane and restores
//! the pre-rotation magnitude, so the correction redirects momentum
//! without creating or destroying it.
//!
//! The normal component removed here, `hcdt`, is the centripetal
//! momentum change of the step; divided by `dt` it contributes to the
//! effective normal pressure in the friction phase.

use crate::types::Rect;

/// Rotate `(uh, vh, wh)` onto the bed tangent plane, preserve the
/// magnitude, and record the removed normal component in `hcdt`.
pub(crate) fn project_to_bed(
    uh: &mut [f64],
    vh: &mut [f64],
    wh: &mut [f64],
    dbdx: &[f64],
    dbdy: &[f64],
    cos_beta: &[f64],
    hcdt: &mut [f64],
    nx: usize,
    rect: Rect,
) {
    for i in rect.r0..=rect.r1 {
        for j in rect.c0..=rect.c1 {
            let idx = i * nx + j;
            let bx = dbdx[idx];
            let by = dbdy[idx];
            let cb = cos_beta[idx];

            let m = (uh[idx] * uh[idx] + vh[idx] * vh[idx] + wh[idx] * wh[idx]).sqrt();
            let hc = (uh[idx] * bx + vh[idx] * by - wh[idx]) * cb;

            uh[idx] -= hc * bx * cb;
            vh[idx] -= hc * by * cb;
            wh[idx] += hc * cb;
            hcdt[idx] = hc;

            let m_proj =
                (uh[idx] * uh[idx] + vh[idx] * vh[idx] + wh[idx] * wh[idx]).sqrt();
            if m_proj > 0.0 {
                let scale = m / m_proj;
                uh[idx] *= scale;
                vh[idx] *= scale;
                wh[idx] *= scale;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn run_single(
        uh0: f64,
        vh0: f64,
        wh0: f64,
        bx: f64,
        by: f64,
    ) -> (f64, f64, f64, f64) {
        let cb = 1.0 / (1.0 + bx * bx + by * by).sqrt();
        let mut uh = vec![uh0];
        let mut vh = vec![vh0];
        let mut wh = vec![wh0];
        let mut hcdt = vec![0.0];
        project_to_bed(
            &mut uh,
            &mut vh,
            &mut wh,
            &[bx],
            &[by],
            &[cb],
            &mut hcdt,
            1,
            Rect::new(0, 0, 0, 0),
        );
        (uh[0], vh[0], wh[0], hcdt[0])
    }

    #[test]
    fn test_flat_bed_is_tangent_already() {
        let (uh, vh, wh, hc) = run_single(3.0, -2.0, 0.0, 0.0, 0.0);
        assert!((uh - 3.0).abs() < TOL);
        assert!((vh + 2.0).abs() < TOL);
        assert!(wh.abs() < TOL);
        assert!(hc.abs() < TOL);
    }

    #[test]
    fn test_result_is_tangent_to_bed() {
        for &(uh0, vh0, wh0, bx, by) in &[
            (4.0_f64, 1.0, 0.0, -0.3, 0.1),
            (-2.0, 5.0, 1.5, 0.2, 0.4),
            (0.5, -0.5, -2.0, -0.05, -0.8),
        ] {
            let bx: f64 = bx;
            let by: f64 = by;
            let cb: f64 = 1.0 / (1.0 + bx * bx + by * by).sqrt();
            let (uh, vh, wh, _) = run_single(uh0, vh0, wh0, bx, by);
            let residual = (uh * bx + vh * by - wh) * cb;
            assert!(
                residual.abs() < 1e-10,
                "momentum not tangent: residual = {residual}"
            );
        }
    }

    #[test]
    fn test_magnitude_preserved() {
        let (uh, vh, wh, _) = run_single(4.0, 1.0, 0.3, -0.3, 0.1);
        let m0 = (4.0f64 * 4.0 + 1.0 + 0.3 * 0.3).sqrt();
        let m = (uh * uh + vh * vh + wh * wh).sqrt();
        assert!((m - m0).abs() < 1e-10, "magnitude changed: {m0} -> {m}");
    }

    #[test]
    fn test_zero_momentum_stays_zero() {
        let (uh, vh, wh, hc) = run_single(0.0, 0.0, 0.0, -0.4, 0.2);
        assert_eq!(uh, 0.0);
        assert_eq!(vh, 0.0);
        assert_eq!(wh, 0.0);
        assert_eq!(hc, 0.0);
    }
}
