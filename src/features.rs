//! Feature extractor: per-label moments from a labeled image.

use crate::ccl::Labeled;
use crate::roi::Roi;

/// Compute `S, Sx, Sy, (xmin,xmax,ymin,ymax)` per label and build the
/// corresponding ROI set. Traps (via `assert!`) if `labeled.n` disagrees
/// with the label range actually present, since that can only happen if a
/// caller bypassed `ccl::label`'s MAX_ROI check.
pub fn extract(labeled: &Labeled, frame_index: u64) -> Vec<Roi> {
    let n = labeled.n as usize;
    let mut s = vec![0f64; n + 1];
    let mut sx = vec![0f64; n + 1];
    let mut sy = vec![0f64; n + 1];
    let mut xmin = vec![u32::MAX; n + 1];
    let mut xmax = vec![0u32; n + 1];
    let mut ymin = vec![u32::MAX; n + 1];
    let mut ymax = vec![0u32; n + 1];

    for row in 0..labeled.height() {
        for col in 0..labeled.width() {
            let label = labeled.get(row, col);
            if label == 0 {
                continue;
            }
            let label = label as usize;
            assert!(
                label <= n,
                "label {label} exceeds declared component count {n}; CCL invariant violated"
            );
            s[label] += 1.0;
            sx[label] += col as f64;
            sy[label] += row as f64;
            xmin[label] = xmin[label].min(col);
            xmax[label] = xmax[label].max(col);
            ymin[label] = ymin[label].min(row);
            ymax[label] = ymax[label].max(row);
        }
    }

    (1..=n)
        .map(|id| Roi {
            id: id as u32,
            xmin: xmin[id],
            xmax: xmax[id],
            ymin: ymin[id],
            ymax: ymax[id],
            s: s[id],
            sx: sx[id],
            sy: sy[id],
            prev_id: 0,
            next_id: 0,
            time: 0,
            time_motion: 0,
            is_extrapolated: false,
            frame: frame_index,
            track_id: 0,
            motion: false,
            error: 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccl;
    use crate::frame::LumaFrame;
    use crate::threshold::MASK_SET;

    #[test]
    fn single_pixel_blob_has_unit_area_and_degenerate_bbox() {
        let mut mask = LumaFrame::zeros(3, 3);
        mask.set(1, 1, MASK_SET);
        let labeled = ccl::label(&mask, 10).unwrap();
        let rois = extract(&labeled, 0);
        assert_eq!(rois.len(), 1);
        let r = &rois[0];
        assert_eq!(r.s, 1.0);
        assert_eq!((r.xmin, r.xmax, r.ymin, r.ymax), (1, 1, 1, 1));
        assert_eq!(r.centroid(), (1.0, 1.0));
    }

    #[test]
    fn rectangular_blob_centroid_is_its_middle() {
        let mut mask = LumaFrame::zeros(4, 4);
        for row in 0..2 {
            for col in 0..2 {
                mask.set(row, col, MASK_SET);
            }
        }
        let labeled = ccl::label(&mask, 10).unwrap();
        let rois = extract(&labeled, 7);
        let r = &rois[0];
        assert_eq!(r.s, 4.0);
        assert_eq!(r.centroid(), (0.5, 0.5));
        assert_eq!(r.frame, 7);
    }
}
