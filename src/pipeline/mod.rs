//! Shared per-frame processing used by both scheduling modes: detection
//! (threshold -> label -> extract -> merge) and the stage-2 handoff
//! (associate -> estimate motion -> advance the tracker).

pub mod parallel;
pub mod sequence;

use crate::ccl;
use crate::config::Config;
use crate::error::Result;
use crate::features;
use crate::frame::LumaFrame;
use crate::io::csv_log::CsvLog;
use crate::knn;
use crate::merge;
use crate::motion::{self, MotionEstimate};
use crate::roi::{Roi, NO_ID};
use crate::threshold;
use crate::tracker::Tracker;
use std::fs::File;

/// The surviving, merged ROI set for one frame.
#[derive(Clone, Debug)]
pub struct DetectedFrame {
    pub index: u64,
    pub rois: Vec<Roi>,
}

/// Run the per-frame detection stage: hysteresis threshold, connected-
/// component labeling, moment extraction, and the merge filter.
pub fn detect_frame(frame: &LumaFrame, config: &Config, max_roi: usize, index: u64) -> Result<DetectedFrame> {
    let (low, high) = threshold::threshold_pair(frame, config.light_min, config.light_max);
    let labeled = ccl::label(&low, max_roi)?;
    let rois = features::extract(&labeled, index);
    let (survivors, _out_image) = merge::merge(
        &rois,
        &labeled,
        &high,
        config.surface_min as f64,
        config.surface_max as f64,
    );
    Ok(DetectedFrame {
        index,
        rois: survivors,
    })
}

/// Associate `prev` and `cur`, fit global motion from the matches, and
/// advance the tracker by one frame. Returns the motion estimate (useful
/// for debug logging).
pub fn advance(
    tracker: &mut Tracker,
    prev: &mut DetectedFrame,
    cur: &mut DetectedFrame,
    k: usize,
) -> Result<MotionEstimate> {
    let (source_to_target, target_to_source) = knn::associate(&prev.rois, &cur.rois, k);

    for (i, maybe_j) in source_to_target.iter().enumerate() {
        prev.rois[i].next_id = maybe_j.map(|j| cur.rois[j].id).unwrap_or(NO_ID);
    }
    for (j, maybe_i) in target_to_source.iter().enumerate() {
        cur.rois[j].prev_id = maybe_i.map(|i| prev.rois[i].id).unwrap_or(NO_ID);
    }

    let mut matched_indices = Vec::new();
    let mut pairs = Vec::new();
    for (i, maybe_j) in source_to_target.iter().enumerate() {
        if let Some(j) = *maybe_j {
            let (ax, ay) = prev.rois[i].centroid();
            let (bx, by) = cur.rois[j].centroid();
            pairs.push((ax, ay, bx, by));
            matched_indices.push(i);
        }
    }

    let motion = motion::estimate(&pairs);
    for (pair_idx, &roi_idx) in matched_indices.iter().enumerate() {
        prev.rois[roi_idx].error = motion.errors[pair_idx];
    }

    tracker.step(&mut prev.rois, &mut cur.rois, &motion, cur.index)?;
    Ok(motion)
}

/// Open the per-frame ROI/motion debug CSV logs under `config.out_stats`,
/// if set. Writes `rois.csv` and `motion.csv` into that directory.
pub fn open_csv_log(config: &Config) -> Result<Option<CsvLog<File>>> {
    let Some(dir) = &config.out_stats else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)?;
    let roi_sink = File::create(dir.join("rois.csv"))?;
    let motion_sink = File::create(dir.join("motion.csv"))?;
    Ok(Some(CsvLog::new(roi_sink, motion_sink)))
}
