//! Active-rectangle tracking.
//!
//! Flow usually covers a small part of the domain. Each step we find
//! the tight bounding rectangle of cells above the motion threshold,
//! expand it by a two-cell halo (donor-cell advection moves material at
//! most one cell per step, gradients reach one further) and clamp it to
//! the grid. All per-step kernels then loop over this window only.

use crate::types::{Field2D, Rect, SpatialParam};

/// Tight bounding rectangle of `h > h_min`, expanded by `halo` cells
/// and clamped to the grid. `None` when no cell is above threshold.
pub(crate) fn active_rect(h: &Field2D, h_min: &SpatialParam, halo: usize) -> Option<Rect> {
    let (ny, nx) = h.shape();
    let data = h.as_slice();

    let mut r0 = usize::MAX;
    let mut r1 = 0usize;
    let mut c0 = usize::MAX;
    let mut c1 = 0usize;

    for i in 0..ny {
        let row = i * nx;
        for j in 0..nx {
            if data[row + j] > h_min.at(row + j) {
                r0 = r0.min(i);
                r1 = r1.max(i);
                c0 = c0.min(j);
                c1 = c1.max(j);
            }
        }
    }

    if r0 == usize::MAX {
        return None;
    }
    Some(Rect::new(r0, r1, c0, c1).expanded(halo, ny, nx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask() {
        let h = Field2D::zeros(6, 6);
        assert_eq!(active_rect(&h, &SpatialParam::Uniform(0.0), 2), None);
    }

    #[test]
    fn test_single_cell_with_halo() {
        let mut h = Field2D::zeros(10, 10);
        h.set(5, 4, 1.0);
        let r = active_rect(&h, &SpatialParam::Uniform(0.0), 2).unwrap();
        assert_eq!(r, Rect::new(3, 7, 2, 6));
    }

    #[test]
    fn test_halo_clamped_at_walls() {
        let mut h = Field2D::zeros(8, 8);
        h.set(0, 7, 1.0);
        let r = active_rect(&h, &SpatialParam::Uniform(0.0), 2).unwrap();
        assert_eq!(r, Rect::new(0, 2, 5, 7));
    }

    #[test]
    fn test_threshold_excludes_thin_cells() {
        let mut h = Field2D::zeros(8, 8);
        h.set(2, 2, 0.005);
        h.set(4, 4, 0.5);
        let r = active_rect(&h, &SpatialParam::Uniform(0.01), 2).unwrap();
        assert_eq!(r, Rect::new(2, 6, 2, 6));
    }

    #[test]
    fn test_per_cell_threshold() {
        let mut h = Field2D::zeros(6, 6);
        h.set(1, 1, 0.2);
        h.set(4, 4, 0.2);
        // Higher threshold over the lower-right half masks one of them.
        let h_min = Field2D::from_fn(6, 6, |i, _| if i >= 3 { 0.5 } else { 0.0 });
        let r = active_rect(&h, &SpatialParam::PerCell(h_min), 1).unwrap();
        assert_eq!(r, Rect::new(0, 2, 0, 2));
    }
}
