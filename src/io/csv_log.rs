//! Optional per-frame debug logs (ROI, KNN match, motion, track state),
//! written as CSV via the `csv` crate for easy offline inspection.

use crate::error::Result;
use crate::motion::MotionEstimate;
use crate::roi::Roi;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct RoiRow {
    frame: u64,
    id: u32,
    xmin: u32,
    xmax: u32,
    ymin: u32,
    ymax: u32,
    s: f64,
    prev_id: u32,
    next_id: u32,
    track_id: u32,
}

#[derive(Serialize)]
struct MotionRow {
    frame: u64,
    theta: f64,
    tx: f64,
    ty: f64,
    mean_error: f64,
    std_deviation: f64,
}

/// Logs ROI and motion observations to two separate CSV writers.
pub struct CsvLog<W: Write> {
    roi_writer: csv::Writer<W>,
    motion_writer: csv::Writer<W>,
}

impl<W: Write> CsvLog<W> {
    pub fn new(roi_sink: W, motion_sink: W) -> Self {
        Self {
            roi_writer: csv::Writer::from_writer(roi_sink),
            motion_writer: csv::Writer::from_writer(motion_sink),
        }
    }

    pub fn log_rois(&mut self, frame: u64, rois: &[Roi]) -> Result<()> {
        for r in rois {
            self.roi_writer.serialize(RoiRow {
                frame,
                id: r.id,
                xmin: r.xmin,
                xmax: r.xmax,
                ymin: r.ymin,
                ymax: r.ymax,
                s: r.s,
                prev_id: r.prev_id,
                next_id: r.next_id,
                track_id: r.track_id,
            })?;
        }
        self.roi_writer.flush()?;
        Ok(())
    }

    pub fn log_motion(&mut self, frame: u64, estimate: &MotionEstimate) -> Result<()> {
        self.motion_writer.serialize(MotionRow {
            frame,
            theta: estimate.motion.theta,
            tx: estimate.motion.tx,
            ty: estimate.motion.ty,
            mean_error: estimate.mean_error,
            std_deviation: estimate.std_deviation,
        })?;
        self.motion_writer.flush()?;
        Ok(())
    }
}
