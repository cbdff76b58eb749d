//! Feature merger: hysteresis + area filter, with dense renumbering of
//! survivors.

use crate::ccl::Labeled;
use crate::frame::LumaFrame;
use crate::roi::Roi;
use crate::threshold::MASK_SET;

/// Does any pixel in `roi`'s bounding box land on a set pixel of `high_mask`?
fn intersects_high_mask(roi: &Roi, high_mask: &LumaFrame) -> bool {
    for row in roi.ymin..=roi.ymax {
        for col in roi.xmin..=roi.xmax {
            if high_mask.get(row, col) == MASK_SET {
                return true;
            }
        }
    }
    false
}

/// Retain ROIs that (1) intersect `high_mask` and (2) have area in
/// `[s_min, s_max]`; survivors are renumbered `1..=n_out`, preserving input
/// order. Also relabels `labeled` in place into an output label image where
/// surviving pixels carry their new dense id and dropped pixels become 0.
pub fn merge(
    rois: &[Roi],
    labeled: &Labeled,
    high_mask: &LumaFrame,
    s_min: f64,
    s_max: f64,
) -> (Vec<Roi>, Vec<u32>) {
    let mut old_to_new = vec![0u32; rois.len() + 1];
    let mut survivors = Vec::new();

    for roi in rois {
        let retained = roi.s >= s_min && roi.s <= s_max && intersects_high_mask(roi, high_mask);
        if retained {
            let new_id = (survivors.len() + 1) as u32;
            old_to_new[roi.id as usize] = new_id;
            let mut out = roi.clone();
            out.id = new_id;
            survivors.push(out);
        }
    }

    let out_image: Vec<u32> = labeled
        .as_slice()
        .iter()
        .map(|&old| {
            if old == 0 {
                0
            } else {
                old_to_new[old as usize]
            }
        })
        .collect();

    (survivors, out_image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccl;
    use crate::threshold::MASK_SET;

    fn blob_mask(w: u32, h: u32, pixels: &[(u32, u32)]) -> LumaFrame {
        let mut f = LumaFrame::zeros(w, h);
        for &(r, c) in pixels {
            f.set(r, c, MASK_SET);
        }
        f
    }

    #[test]
    fn drops_components_without_high_mask_overlap() {
        let low = blob_mask(5, 1, &[(0, 0), (0, 3)]);
        let labeled = ccl::label(&low, 10).unwrap();
        let rois = crate::features::extract(&labeled, 0);
        // high mask only covers the second blob.
        let high = blob_mask(5, 1, &[(0, 3)]);
        let (survivors, _) = merge(&rois, &labeled, &high, 0.0, 100.0);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].xmin, 3);
    }

    #[test]
    fn drops_components_outside_area_bounds() {
        let low = blob_mask(5, 1, &[(0, 0), (0, 1), (0, 3)]);
        let labeled = ccl::label(&low, 10).unwrap();
        let rois = crate::features::extract(&labeled, 0);
        let high = blob_mask(5, 1, &[(0, 0), (0, 1), (0, 3)]);
        let (survivors, _) = merge(&rois, &labeled, &high, 2.0, 100.0);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].s, 2.0);
    }

    #[test]
    fn survivors_are_densely_renumbered_preserving_order() {
        // Three components of areas 1, 3, 1 (column groups at 0, 2..4, 6);
        // an area bound of [1,1] drops only the middle one.
        let low = blob_mask(7, 1, &[(0, 0), (0, 2), (0, 3), (0, 4), (0, 6)]);
        let labeled = ccl::label(&low, 10).unwrap();
        let rois = crate::features::extract(&labeled, 0);
        assert_eq!(rois.len(), 3);
        let high = blob_mask(7, 1, &[(0, 0), (0, 2), (0, 3), (0, 4), (0, 6)]);
        let (survivors, out_image) = merge(&rois, &labeled, &high, 1.0, 1.0);
        let ids: Vec<u32> = survivors.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(survivors[0].xmin, 0);
        assert_eq!(survivors[1].xmin, 6);
        // out_image no longer contains the dropped middle component's old id.
        assert!(out_image.iter().all(|&v| v <= 2));
    }
}
