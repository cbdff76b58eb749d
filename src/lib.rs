//! Detection and multi-frame tracking of meteors, stars and noise in
//! luminance video.
//!
//! The pipeline, front to back: [`threshold`] -> [`ccl`] -> [`features`] ->
//! [`merge`] produce a per-frame ROI set; [`knn`] associates it with the
//! previous frame's; [`motion`] fits the global rigid motion from the
//! matches; [`tracker`] consumes both to spawn, extend, extrapolate through,
//! and retire tracks. [`pipeline`] wires this into either a single-threaded
//! scheduler or a three-stage worker pool.

pub mod bbox;
pub mod ccl;
pub mod config;
pub mod error;
pub mod features;
pub mod frame;
pub mod history_ring;
pub mod io;
pub mod knn;
pub mod logging;
pub mod merge;
pub mod motion;
pub mod pipeline;
pub mod ring_delay;
pub mod roi;
pub mod threshold;
pub mod track;
pub mod tracker;

pub use error::{Error, Result};

/// Upper bound on connected components labeled per frame. Exceeding it is a
/// capacity error, not a silently-truncated result.
pub const MAX_ROI: usize = 4096;

/// Upper bound on simultaneously live tracks.
pub const MAX_TRACKS: usize = 1024;

/// Upper bound on history-ring entries retained for track-spawn chains.
pub const HISTORY_RING_CAPACITY: usize = 8192;

/// Build a [`tracker::TrackerConfig`] from a validated [`config::Config`]
/// plus this crate's capacity limits.
pub fn tracker_config(config: &config::Config) -> tracker::TrackerConfig {
    tracker::TrackerConfig {
        r_extrapol: config.r_extrapol,
        diff_dev: config.diff_dev,
        d_line: config.d_line,
        fra_star_min: config.fra_star_min,
        fra_meteor_min: config.fra_meteor_min,
        fra_meteor_max: config.fra_meteor_max,
        track_all: config.track_all,
        max_tracks: MAX_TRACKS,
        history_capacity: HISTORY_RING_CAPACITY,
    }
}

/// Run a complete detection/tracking pass over `source` against `config`,
/// dispatching to the sequence or pipeline scheduler as configured, and
/// return the finished tracker (tracks + bounding-box log).
pub fn run<S>(source: S, config: &config::Config) -> Result<tracker::Tracker>
where
    S: frame::FrameSource + Send + 'static,
{
    let mut tracker = tracker::Tracker::new(tracker_config(config));
    match config.schedule {
        config::ScheduleMode::Sequence => {
            pipeline::sequence::run(source, config, MAX_ROI, &mut tracker)?;
        }
        config::ScheduleMode::Pipeline { stage1_threads } => {
            pipeline::parallel::run(source, config.clone(), MAX_ROI, stage1_threads, &mut tracker)?;
        }
    }
    Ok(tracker)
}
