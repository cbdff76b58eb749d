//! The track state machine: spawns new tracks from sustained motion or
//! stillness (pass 1), then advances every live track by one frame (pass
//! 2) — adopting an associated ROI, extrapolating through a gap, or
//! retiring.

use crate::bbox::{BBoxLog, BBoxRecord};
use crate::history_ring::HistoryRing;
use crate::motion::MotionEstimate;
use crate::roi::Roi;
use crate::track::{bounding_box_of, LineModel, ObjType, State, Track};

/// How long a non-meteor track may sit without a fresh association before
/// it's freed, when `track_all` is off. A meteor track instead uses
/// `fra_meteor_max` for this purpose.
pub const STALE_TRACK_AGE_LIMIT: u32 = 150;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("history ring exhausted (capacity {capacity})")]
    HistoryRingExhausted { capacity: usize },
    #[error("track count exceeds MAX_TRACKS ({max_tracks})")]
    TooManyTracks { max_tracks: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug)]
pub struct TrackerConfig {
    pub r_extrapol: u32,
    pub diff_dev: f64,
    pub d_line: f64,
    pub fra_star_min: u32,
    pub fra_meteor_min: u32,
    pub fra_meteor_max: u32,
    pub track_all: bool,
    pub max_tracks: usize,
    pub history_capacity: usize,
}

pub struct Tracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    history: HistoryRing,
    bbox_log: BBoxLog,
    next_track_id: u32,
}

fn within_l_inf_square(cx: f64, cy: f64, px: f64, py: f64, radius: u32) -> bool {
    (cx - px).abs() <= radius as f64 && (cy - py).abs() <= radius as f64
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            history: HistoryRing::with_capacity(config.history_capacity),
            bbox_log: BBoxLog::new(),
            next_track_id: 1,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn bbox_log(&self) -> &BBoxLog {
        &self.bbox_log
    }

    fn record_bbox(&mut self, track_id: u32, roi: &Roi) {
        let (bb_x, bb_y, rx, ry) = bounding_box_of(roi);
        self.bbox_log.push(BBoxRecord {
            frame: roi.frame,
            rx,
            ry,
            bb_x,
            bb_y,
            track_id,
        });
    }

    fn track_already_ends_on(&self, roi: &Roi) -> bool {
        self.tracks
            .iter()
            .any(|t| t.state != State::Finished && t.end.id == roi.id && t.end.frame == roi.frame)
    }

    fn allocate_track_id(&mut self) -> Result<u32> {
        if self.tracks.len() >= self.config.max_tracks {
            return Err(Error::TooManyTracks {
                max_tracks: self.config.max_tracks,
            });
        }
        let id = self.next_track_id;
        self.next_track_id += 1;
        Ok(id)
    }

    /// Advance the tracker by one frame. `prev_rois` is the ROI set at
    /// `frame - 1` (already carrying `next_id`/`error`/`time`/`time_motion`
    /// from prior processing), `cur_rois` is the ROI set at `frame` (with
    /// `prev_id` populated by the matcher). Both are mutated in place:
    /// matched fields propagate forward and `is_extrapolated`/`track_id`
    /// get set as tracks adopt ROIs.
    pub fn step(
        &mut self,
        prev_rois: &mut [Roi],
        cur_rois: &mut [Roi],
        motion: &MotionEstimate,
        frame: u64,
    ) -> Result<()> {
        self.spawn_new_tracks(prev_rois, cur_rois, motion, frame)?;
        self.update_existing_tracks(prev_rois, cur_rois, motion, frame)?;
        self.history
            .evict_older_than(frame, self.config.fra_star_min as u64);
        Ok(())
    }

    fn spawn_new_tracks(
        &mut self,
        prev_rois: &mut [Roi],
        cur_rois: &mut [Roi],
        motion: &MotionEstimate,
        frame: u64,
    ) -> Result<()> {
        for i in 0..prev_rois.len() {
            let next_id = prev_rois[i].next_id;
            if next_id == crate::roi::NO_ID {
                continue;
            }
            let Some(next_idx) = cur_rois.iter().position(|r| r.id == next_id) else {
                continue;
            };

            let error_i = prev_rois[i].error;
            let is_motion = (error_i - motion.mean_error).abs()
                > self.config.diff_dev * motion.std_deviation;

            if is_motion {
                if prev_rois[i].is_extrapolated {
                    continue;
                }
                let time_motion = prev_rois[i].time_motion + 1;
                prev_rois[i].time_motion = time_motion;
                cur_rois[next_idx].time_motion = time_motion;

                if !self
                    .history
                    .insert(prev_rois[i].clone(), cur_rois[next_idx].clone(), frame)
                {
                    return Err(Error::HistoryRingExhausted {
                        capacity: self.history.capacity(),
                    });
                }

                if time_motion >= self.config.fra_meteor_min
                    && !self.track_already_ends_on(&prev_rois[i])
                {
                    self.spawn_meteor_track(
                        &prev_rois[i].clone(),
                        &cur_rois[next_idx].clone(),
                        frame,
                    )?;
                }
            } else if self.config.track_all {
                let time = prev_rois[i].time + 1;
                prev_rois[i].time = time;
                cur_rois[next_idx].time = time;

                if !self
                    .history
                    .insert(prev_rois[i].clone(), cur_rois[next_idx].clone(), frame)
                {
                    return Err(Error::HistoryRingExhausted {
                        capacity: self.history.capacity(),
                    });
                }

                if time >= self.config.fra_star_min
                    && !self.track_already_ends_on(&prev_rois[i])
                {
                    self.spawn_star_track(&cur_rois[next_idx].clone(), frame)?;
                }
            }
        }
        Ok(())
    }

    fn spawn_meteor_track(&mut self, roi_i: &Roi, next: &Roi, frame: u64) -> Result<()> {
        let chain_len = (self.config.fra_meteor_min as usize).saturating_sub(1);
        let chain = self.history.walk_back(roi_i.id, frame, chain_len);
        let mut oldest_to_newest: Vec<Roi> =
            chain.iter().rev().map(|(_, cur)| cur.clone()).collect();
        if oldest_to_newest.is_empty() {
            oldest_to_newest.push(roi_i.clone());
        }
        oldest_to_newest.push(next.clone());

        let begin = oldest_to_newest.first().cloned().unwrap_or_else(|| roi_i.clone());
        let end = next.clone();
        let last_two = &oldest_to_newest[oldest_to_newest.len().saturating_sub(2)..];
        let (x0, y0) = last_two[0].centroid();
        let (x1, y1) = last_two[last_two.len() - 1].centroid();
        let (line, dx, dy) = LineModel::fit(x0, y0, x1, y1);

        let id = self.allocate_track_id()?;
        let (bb_x, bb_y, rx, ry) = bounding_box_of(&end);
        let track = Track {
            id,
            obj_type: ObjType::Meteor,
            state: State::New,
            begin,
            end: end.clone(),
            x: x1,
            y: y1,
            dx,
            dy,
            line,
            timestamp: frame,
            time: oldest_to_newest.len() as u32,
            bb_x,
            bb_y,
            rx,
            ry,
        };
        self.record_bbox(id, &end);
        self.tracks.push(track);
        Ok(())
    }

    fn spawn_star_track(&mut self, roi: &Roi, frame: u64) -> Result<()> {
        let chain_len = (self.config.fra_star_min as usize).saturating_sub(1);
        let chain = self.history.walk_back(roi.id, frame, chain_len);
        let oldest = chain.last().map(|(_, cur)| cur.clone()).unwrap_or_else(|| roi.clone());
        let (x, y) = roi.centroid();

        let id = self.allocate_track_id()?;
        let (bb_x, bb_y, rx, ry) = bounding_box_of(roi);
        let track = Track {
            id,
            obj_type: ObjType::Star,
            state: State::New,
            begin: oldest,
            end: roi.clone(),
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            line: LineModel::Vertical,
            timestamp: frame,
            time: self.config.fra_star_min,
            bb_x,
            bb_y,
            rx,
            ry,
        };
        self.record_bbox(id, roi);
        self.tracks.push(track);
        Ok(())
    }

    fn update_existing_tracks(
        &mut self,
        prev_rois: &[Roi],
        cur_rois: &mut [Roi],
        motion: &MotionEstimate,
        frame: u64,
    ) -> Result<()> {
        for t_idx in 0..self.tracks.len() {
            if self.tracks[t_idx].state == State::Finished {
                continue;
            }

            if !self.config.track_all {
                let limit = if self.tracks[t_idx].obj_type == ObjType::Meteor {
                    self.config.fra_meteor_max
                } else {
                    STALE_TRACK_AGE_LIMIT
                };
                if self.tracks[t_idx].time > limit {
                    self.tracks[t_idx].state = State::Finished;
                    continue;
                }
            }

            match self.tracks[t_idx].state {
                State::Extrapolated => {
                    self.try_reacquire_extrapolated(t_idx, cur_rois);
                }
                State::Lost => {
                    self.try_reacquire_lost(t_idx, cur_rois);
                }
                _ => {}
            }

            if matches!(self.tracks[t_idx].state, State::Updated | State::New) {
                self.advance_linear(t_idx, prev_rois, cur_rois, motion);
            }
        }
        Ok(())
    }

    /// Re-acquire an `EXTRAPOLATED` track from a nearby ROI in the current
    /// frame. The adopted ROI is marked `is_extrapolated` so that, once this
    /// frame's ROI set becomes `prev_rois` on the next `step`, pass 1 won't
    /// spawn a second track from it.
    fn try_reacquire_extrapolated(&mut self, t_idx: usize, cur_rois: &mut [Roi]) {
        let (px, py) = (self.tracks[t_idx].x, self.tracks[t_idx].y);
        let radius = self.config.r_extrapol;
        let found = cur_rois.iter_mut().find(|r| {
            let (cx, cy) = r.centroid();
            within_l_inf_square(cx, cy, px, py, radius)
        });
        if let Some(roi) = found {
            roi.is_extrapolated = true;
            let roi = roi.clone();
            let (x, y) = roi.centroid();
            self.tracks[t_idx].state = State::Updated;
            self.tracks[t_idx].x = x;
            self.tracks[t_idx].y = y;
            self.tracks[t_idx].end = roi.clone();
            self.record_bbox(self.tracks[t_idx].id, &roi);
        }
    }

    fn try_reacquire_lost(&mut self, t_idx: usize, cur_rois: &mut [Roi]) {
        let (px, py) = (self.tracks[t_idx].x, self.tracks[t_idx].y);
        let radius = self.config.r_extrapol;
        let found = cur_rois.iter_mut().find(|r| {
            r.prev_id == crate::roi::NO_ID && {
                let (cx, cy) = r.centroid();
                within_l_inf_square(cx, cy, px, py, radius)
            }
        });
        match found {
            Some(roi) => {
                roi.is_extrapolated = true;
                self.tracks[t_idx].state = State::Extrapolated;
                self.tracks[t_idx].time += 2;
            }
            None => {
                self.tracks[t_idx].state = State::Finished;
            }
        }
    }

    fn advance_linear(
        &mut self,
        t_idx: usize,
        prev_rois: &[Roi],
        cur_rois: &mut [Roi],
        motion: &MotionEstimate,
    ) {
        let end_id = self.tracks[t_idx].end.id;
        let next_id = prev_rois
            .iter()
            .find(|r| r.id == end_id)
            .map(|r| r.next_id)
            .unwrap_or(crate::roi::NO_ID);

        let Some(next) = (next_id != crate::roi::NO_ID)
            .then(|| cur_rois.iter().find(|r| r.id == next_id))
            .flatten()
        else {
            self.extrapolate(t_idx, motion);
            return;
        };

        let (nx, ny) = next.centroid();
        let (ex, ey) = self.tracks[t_idx].end.centroid();
        let (new_line, new_dx, new_dy) = LineModel::fit(ex, ey, nx, ny);
        let predicted_y = self.tracks[t_idx].line.predict(nx);

        let accepted = match self.tracks[t_idx].line {
            LineModel::Vertical => new_line == LineModel::Vertical,
            LineModel::Sloped { .. } => {
                (ny - predicted_y).abs() < self.config.d_line
                    && same_sign(new_dx, self.tracks[t_idx].dx)
                    && same_sign(new_dy, self.tracks[t_idx].dy)
                    && new_line.sign_agrees(&self.tracks[t_idx].line)
            }
        };

        if accepted {
            let next = next.clone();
            let next_id = next.id;
            // lag x/y one frame behind end: they hold end's centroid *before*
            // this update, so extrapolate() can recover the last displacement.
            self.tracks[t_idx].x = ex;
            self.tracks[t_idx].y = ey;
            self.tracks[t_idx].dx = new_dx;
            self.tracks[t_idx].dy = new_dy;
            self.tracks[t_idx].line = new_line;
            self.tracks[t_idx].end = next.clone();
            self.tracks[t_idx].time += 1;
            self.tracks[t_idx].obj_type = ObjType::Meteor;
            self.tracks[t_idx].state = State::Updated;
            self.record_bbox(self.tracks[t_idx].id, &next);
            if let Some(roi) = cur_rois.iter_mut().find(|r| r.id == next_id) {
                roi.track_id = self.tracks[t_idx].id;
            }
        } else if self.tracks[t_idx].obj_type == ObjType::Meteor {
            if self.config.track_all {
                self.tracks[t_idx].obj_type = ObjType::Noise;
                self.tracks[t_idx].state = State::Updated;
            } else {
                self.tracks[t_idx].state = State::Finished;
            }
        }
    }

    fn extrapolate(&mut self, t_idx: usize, motion: &MotionEstimate) {
        let end = self.tracks[t_idx].end.clone();
        let (ex, ey) = end.centroid();
        let (mx, my) = motion.motion.apply(ex, ey);
        let dx = self.tracks[t_idx].dx;
        let dy = self.tracks[t_idx].dy;
        let x = self.tracks[t_idx].x;
        let y = self.tracks[t_idx].y;
        let predicted_x = mx + (ex - dx - x);
        let predicted_y = my + (ey - dy - y);
        self.tracks[t_idx].x = predicted_x;
        self.tracks[t_idx].y = predicted_y;
        self.tracks[t_idx].state = State::Lost;
    }
}

fn same_sign(a: f64, b: f64) -> bool {
    (a < 0.0 && b < 0.0) || (a > 0.0 && b > 0.0) || (a == 0.0 && b == 0.0)
}
