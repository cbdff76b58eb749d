//! Single-threaded cooperative scheduler: each tick runs detection and
//! stage-2 association/motion/tracking in dataflow order, no suspension
//! points.

use super::{advance, detect_frame, open_csv_log, DetectedFrame};
use crate::config::Config;
use crate::error::Result;
use crate::frame::FrameSource;
use crate::ring_delay::RingDelay;
use crate::tracker::Tracker;

/// Run `source` to completion against `tracker`, respecting `config`'s
/// `fra_start`/`fra_end`/`skip_fra` window.
pub fn run(
    mut source: impl FrameSource,
    config: &Config,
    max_roi: usize,
    tracker: &mut Tracker,
) -> Result<()> {
    let mut delay: RingDelay<DetectedFrame> = RingDelay::new();
    let mut csv_log = open_csv_log(config)?;

    while let Some(indexed) = source.next_frame() {
        if indexed.index < config.fra_start {
            continue;
        }
        if let Some(end) = config.fra_end {
            if indexed.index > end {
                break;
            }
        }
        if config.skip_fra > 1 && (indexed.index - config.fra_start) % config.skip_fra != 0 {
            continue;
        }

        let mut cur = detect_frame(&indexed.frame, config, max_roi, indexed.index)?;
        if let Some(mut prev) = delay.step(cur.clone()) {
            let motion = advance(tracker, &mut prev, &mut cur, config.k as usize)?;
            if let Some(log) = csv_log.as_mut() {
                log.log_rois(cur.index, &cur.rois)?;
                log.log_motion(cur.index, &motion)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use crate::frame::{InMemorySource, LumaFrame};
    use crate::tracker::TrackerConfig;
    use std::path::PathBuf;

    fn test_config() -> Config {
        Config::try_from(Cli {
            in_video: Some(PathBuf::from("unused")),
            out_bb: None,
            out_tracks: None,
            out_frames: None,
            out_stats: None,
            fra_start: 0,
            fra_end: None,
            skip_fra: 1,
            light_min: 55,
            light_max: 80,
            surface_min: 1,
            surface_max: 1000,
            k: 3,
            r_extrapol: 5,
            angle_max: 20.0,
            diff_dev: 4.0,
            d_line: 3.0,
            fra_star_min: 4,
            fra_meteor_min: 3,
            fra_meteor_max: 100,
            track_all: false,
            pipeline: false,
            pipeline_threads: 4,
        })
        .unwrap()
    }

    fn blob_frame(w: u32, h: u32, x: u32, y: u32) -> LumaFrame {
        let mut f = LumaFrame::zeros(w, h);
        for row in y..(y + 3).min(h) {
            for col in x..(x + 3).min(w) {
                f.set(row, col, 200);
            }
        }
        f
    }

    /// Paint a grid of stationary blobs in the lower-right quadrant, clear
    /// of the moving blob's path in the upper-left, so the global motion fit
    /// has a real population of near-zero-residual matches; a lone moving
    /// blob with no such background matches too few pairs for the fit to
    /// resolve a meaningful `std_deviation` at all.
    fn paint_static_grid(f: &mut LumaFrame) {
        let (w, h) = (f.width(), f.height());
        let mut row = h / 2;
        while row + 2 < h {
            let mut col = w / 2;
            while col + 2 < w {
                f.set(row, col, 200);
                col += 6;
            }
            row += 6;
        }
    }

    #[test]
    fn static_blob_sequence_spawns_no_meteor_by_default() {
        let config = test_config();
        let frames: Vec<_> = (0..10).map(|_| blob_frame(20, 20, 5, 5)).collect();
        let source = InMemorySource::new(frames);
        let mut tracker = Tracker::new(TrackerConfig {
            r_extrapol: config.r_extrapol,
            diff_dev: config.diff_dev,
            d_line: config.d_line,
            fra_star_min: config.fra_star_min,
            fra_meteor_min: config.fra_meteor_min,
            fra_meteor_max: config.fra_meteor_max,
            track_all: config.track_all,
            max_tracks: 64,
            history_capacity: 256,
        });
        run(source, &config, 1000, &mut tracker).unwrap();
        assert!(tracker.tracks().iter().all(|t| t.obj_type != crate::track::ObjType::Meteor));
    }

    #[test]
    fn translating_blob_spawns_a_meteor_track() {
        let config = test_config();
        let frames: Vec<_> = (0..10)
            .map(|i| {
                let mut f = blob_frame(80, 80, 2 + i * 3, 2 + i);
                paint_static_grid(&mut f);
                f
            })
            .collect();
        let source = InMemorySource::new(frames);
        let mut tracker = Tracker::new(TrackerConfig {
            r_extrapol: config.r_extrapol,
            diff_dev: config.diff_dev,
            d_line: config.d_line,
            fra_star_min: config.fra_star_min,
            fra_meteor_min: config.fra_meteor_min,
            fra_meteor_max: config.fra_meteor_max,
            track_all: config.track_all,
            max_tracks: 64,
            history_capacity: 256,
        });
        run(source, &config, 1000, &mut tracker).unwrap();
        assert!(tracker
            .tracks()
            .iter()
            .any(|t| t.obj_type == crate::track::ObjType::Meteor));
    }
}
