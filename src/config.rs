//! CLI surface and validated runtime configuration.
//!
//! `Cli` is the `clap::Parser` derive struct matching the command line;
//! `Config::try_from(Cli)` performs the range/ordering checks and produces
//! the validated configuration the pipeline actually runs with.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("--in-video is required")]
    MissingVideoPath,
    #[error("--fra-star-min must be >= 2, got {0}")]
    FraStarMinTooSmall(u32),
    #[error("--fra-meteor-min must be >= 2, got {0}")]
    FraMeteorMinTooSmall(u32),
    #[error("--fra-meteor-max ({max}) must be >= --fra-meteor-min ({min})")]
    FraMeteorMaxBelowMin { min: u32, max: u32 },
    #[error("--light-min ({min}) must be < --light-max ({max})")]
    LightRangeInverted { min: u8, max: u8 },
    #[error("--surface-min ({min}) must be < --surface-max ({max})")]
    SurfaceRangeInverted { min: u32, max: u32 },
    #[error("-k must be >= 1, got {0}")]
    KTooSmall(u32),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Detection/tracking schedule strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Single-threaded cooperative scheduler.
    Sequence,
    /// Three-stage worker-pool pipeline.
    Pipeline { stage1_threads: usize },
}

/// Command-line surface for the detection binary.
#[derive(clap::Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory of .pgm frames, or a raw packed luminance stream.
    #[arg(long)]
    pub in_video: Option<PathBuf>,
    /// Output bounding-box file.
    #[arg(long)]
    pub out_bb: Option<PathBuf>,
    /// Output tracks file.
    #[arg(long)]
    pub out_tracks: Option<PathBuf>,
    /// Reserved for a future visualizer; currently unused.
    #[arg(long)]
    pub out_frames: Option<PathBuf>,
    /// Directory for optional CSV debug logs.
    #[arg(long)]
    pub out_stats: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    pub fra_start: u64,
    #[arg(long)]
    pub fra_end: Option<u64>,
    #[arg(long, default_value_t = 1)]
    pub skip_fra: u64,

    #[arg(long, default_value_t = 55)]
    pub light_min: u8,
    #[arg(long, default_value_t = 80)]
    pub light_max: u8,
    #[arg(long, default_value_t = 3)]
    pub surface_min: u32,
    #[arg(long, default_value_t = 1000)]
    pub surface_max: u32,

    #[arg(short = 'k', long = "k", default_value_t = 3)]
    pub k: u32,
    #[arg(long, default_value_t = 5)]
    pub r_extrapol: u32,
    #[arg(long, default_value_t = 20.0)]
    pub angle_max: f64,
    #[arg(long, default_value_t = 4.0)]
    pub diff_dev: f64,
    #[arg(long, default_value_t = 3.0)]
    pub d_line: f64,

    #[arg(long, default_value_t = 15)]
    pub fra_star_min: u32,
    #[arg(long, default_value_t = 3)]
    pub fra_meteor_min: u32,
    #[arg(long, default_value_t = 100)]
    pub fra_meteor_max: u32,

    #[arg(long, default_value_t = false)]
    pub track_all: bool,

    #[arg(long, default_value_t = false)]
    pub pipeline: bool,
    #[arg(long, default_value_t = 4)]
    pub pipeline_threads: usize,
}

/// Validated detection/tracking parameters.
#[derive(Clone, Debug)]
pub struct Config {
    pub in_video: PathBuf,
    pub out_bb: Option<PathBuf>,
    pub out_tracks: Option<PathBuf>,
    pub out_frames: Option<PathBuf>,
    pub out_stats: Option<PathBuf>,

    pub fra_start: u64,
    pub fra_end: Option<u64>,
    pub skip_fra: u64,

    pub light_min: u8,
    pub light_max: u8,
    pub surface_min: u32,
    pub surface_max: u32,

    pub k: u32,
    pub r_extrapol: u32,
    pub angle_max: f64,
    pub diff_dev: f64,
    pub d_line: f64,

    pub fra_star_min: u32,
    pub fra_meteor_min: u32,
    pub fra_meteor_max: u32,

    pub track_all: bool,
    pub schedule: ScheduleMode,
}

impl TryFrom<Cli> for Config {
    type Error = Error;

    fn try_from(cli: Cli) -> Result<Self> {
        let in_video = cli.in_video.ok_or(Error::MissingVideoPath)?;

        if cli.fra_star_min < 2 {
            return Err(Error::FraStarMinTooSmall(cli.fra_star_min));
        }
        if cli.fra_meteor_min < 2 {
            return Err(Error::FraMeteorMinTooSmall(cli.fra_meteor_min));
        }
        if cli.fra_meteor_max < cli.fra_meteor_min {
            return Err(Error::FraMeteorMaxBelowMin {
                min: cli.fra_meteor_min,
                max: cli.fra_meteor_max,
            });
        }
        if cli.light_min >= cli.light_max {
            return Err(Error::LightRangeInverted {
                min: cli.light_min,
                max: cli.light_max,
            });
        }
        if cli.surface_min >= cli.surface_max {
            return Err(Error::SurfaceRangeInverted {
                min: cli.surface_min,
                max: cli.surface_max,
            });
        }
        if cli.k < 1 {
            return Err(Error::KTooSmall(cli.k));
        }

        let schedule = if cli.pipeline {
            ScheduleMode::Pipeline {
                stage1_threads: cli.pipeline_threads.max(1),
            }
        } else {
            ScheduleMode::Sequence
        };

        Ok(Config {
            in_video,
            out_bb: cli.out_bb,
            out_tracks: cli.out_tracks,
            out_frames: cli.out_frames,
            out_stats: cli.out_stats,
            fra_start: cli.fra_start,
            fra_end: cli.fra_end,
            skip_fra: cli.skip_fra,
            light_min: cli.light_min,
            light_max: cli.light_max,
            surface_min: cli.surface_min,
            surface_max: cli.surface_max,
            k: cli.k,
            r_extrapol: cli.r_extrapol,
            angle_max: cli.angle_max,
            diff_dev: cli.diff_dev,
            d_line: cli.d_line,
            fra_star_min: cli.fra_star_min,
            fra_meteor_min: cli.fra_meteor_min,
            fra_meteor_max: cli.fra_meteor_max,
            track_all: cli.track_all,
            schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            in_video: Some(PathBuf::from("frames")),
            out_bb: None,
            out_tracks: None,
            out_frames: None,
            out_stats: None,
            fra_start: 0,
            fra_end: None,
            skip_fra: 1,
            light_min: 55,
            light_max: 80,
            surface_min: 3,
            surface_max: 1000,
            k: 3,
            r_extrapol: 5,
            angle_max: 20.0,
            diff_dev: 4.0,
            d_line: 3.0,
            fra_star_min: 15,
            fra_meteor_min: 3,
            fra_meteor_max: 100,
            track_all: false,
            pipeline: false,
            pipeline_threads: 4,
        }
    }

    #[test]
    fn defaults_validate_cleanly() {
        let cfg = Config::try_from(base_cli()).unwrap();
        assert_eq!(cfg.schedule, ScheduleMode::Sequence);
        assert_eq!(cfg.fra_meteor_min, 3);
    }

    #[test]
    fn missing_video_path_is_rejected() {
        let mut cli = base_cli();
        cli.in_video = None;
        assert!(matches!(
            Config::try_from(cli),
            Err(Error::MissingVideoPath)
        ));
    }

    #[test]
    fn fra_meteor_max_below_min_is_rejected() {
        let mut cli = base_cli();
        cli.fra_meteor_min = 10;
        cli.fra_meteor_max = 5;
        assert!(matches!(
            Config::try_from(cli),
            Err(Error::FraMeteorMaxBelowMin { min: 10, max: 5 })
        ));
    }

    #[test]
    fn pipeline_mode_carries_thread_count() {
        let mut cli = base_cli();
        cli.pipeline = true;
        cli.pipeline_threads = 8;
        let cfg = Config::try_from(cli).unwrap();
        assert_eq!(
            cfg.schedule,
            ScheduleMode::Pipeline { stage1_threads: 8 }
        );
    }
}
