//! The ROI (region of interest) data model.

/// `0` is reserved to mean "no id" / "unlinked" throughout the pipeline,
/// matching the original's `ID == 0` sentinel.
pub const NO_ID: u32 = 0;

/// A connected component observed in a single frame, carrying its moments,
/// bounding box and inter-frame association state.
#[derive(Clone, Debug, PartialEq)]
pub struct Roi {
    /// Dense id within this frame, 1-based. Never `0`.
    pub id: u32,
    pub xmin: u32,
    pub xmax: u32,
    pub ymin: u32,
    pub ymax: u32,
    /// Zeroth moment (pixel count).
    pub s: f64,
    /// First moments.
    pub sx: f64,
    pub sy: f64,
    /// `id` of the matching ROI at frame t-1, or `NO_ID`.
    pub prev_id: u32,
    /// `id` of the matching ROI at frame t+1, or `NO_ID`.
    pub next_id: u32,
    /// Consecutive frames of non-motion ("static") association.
    pub time: u32,
    /// Consecutive frames of motion association.
    pub time_motion: u32,
    /// Set once an `EXTRAPOLATED` track re-acquires this ROI, so pass 1 of
    /// the tracker does not also spawn a new track from it.
    pub is_extrapolated: bool,
    /// Frame index this ROI was extracted on.
    pub frame: u64,
    /// Track this ROI has been attached to, or `0`.
    pub track_id: u32,
    /// Set by the motion estimator when this ROI's residual flags it as a
    /// "moving" match; informational/debug only.
    pub motion: bool,
    /// Per-ROI residual from the motion estimator's final pass.
    pub error: f64,
}

impl Roi {
    /// Centroid, `(Sx/S, Sy/S)`.
    #[inline]
    pub fn centroid(&self) -> (f64, f64) {
        (self.sx / self.s, self.sy / self.s)
    }
}

/// A dense `[1..=n]`-indexed set of ROIs for one frame, preserving the
/// invariant that `roi[i].id == i` implicitly via index+1.
#[derive(Clone, Debug, Default)]
pub struct RoiSet {
    rois: Vec<Roi>,
}

impl RoiSet {
    pub fn new() -> Self {
        Self { rois: Vec::new() }
    }

    pub fn from_vec(rois: Vec<Roi>) -> Self {
        debug_assert!(rois
            .iter()
            .enumerate()
            .all(|(i, r)| r.id == (i + 1) as u32));
        Self { rois }
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// Look up a ROI by its dense 1-based id. `0` always returns `None`.
    pub fn get(&self, id: u32) -> Option<&Roi> {
        if id == NO_ID {
            return None;
        }
        self.rois.get((id - 1) as usize)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Roi> {
        if id == NO_ID {
            return None;
        }
        self.rois.get_mut((id - 1) as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Roi> {
        self.rois.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Roi> {
        self.rois.iter_mut()
    }

    pub fn as_slice(&self) -> &[Roi] {
        &self.rois
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_roi(id: u32) -> Roi {
        Roi {
            id,
            xmin: 0,
            xmax: 0,
            ymin: 0,
            ymax: 0,
            s: 1.0,
            sx: 0.0,
            sy: 0.0,
            prev_id: 0,
            next_id: 0,
            time: 0,
            time_motion: 0,
            is_extrapolated: false,
            frame: 0,
            track_id: 0,
            motion: false,
            error: 0.0,
        }
    }

    #[test]
    fn id_zero_never_resolves() {
        let set = RoiSet::from_vec(vec![dummy_roi(1), dummy_roi(2)]);
        assert!(set.get(0).is_none());
        assert!(set.get(1).is_some());
        assert!(set.get(2).is_some());
        assert!(set.get(3).is_none());
    }

    #[test]
    fn centroid_divides_moments_by_area() {
        let mut r = dummy_roi(1);
        r.s = 4.0;
        r.sx = 8.0;
        r.sy = 12.0;
        assert_eq!(r.centroid(), (2.0, 3.0));
    }
}
