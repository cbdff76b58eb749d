use clap::Parser;
use meteor_tracker::config::{Cli, Config};
use meteor_tracker::frame::PgmDirSource;
use meteor_tracker::io::{bbox_file, tracks_file};
use meteor_tracker::track::ObjType;
use tracing::{error, info};

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "meteor_tracker=info,warn");
    }
    let _guard = meteor_tracker::logging::init();

    let cli = Cli::parse();
    let config = match Config::try_from(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    match run(config) {
        Ok(()) => {}
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(config: Config) -> meteor_tracker::Result<()> {
    let source = PgmDirSource::open(&config.in_video)?;
    info!(path = %config.in_video.display(), "starting detection");

    let tracker = meteor_tracker::run(source, &config)?;
    info!(tracks = tracker.tracks().len(), "finished");

    if let Some(path) = &config.out_tracks {
        let records: Vec<_> = tracker
            .tracks()
            .iter()
            .map(|t| tracks_file::TrackRecord {
                id: t.id,
                begin_frame: t.begin.frame,
                end_frame: t.end.frame,
                obj_type: t.obj_type,
                validity: None,
            })
            .collect();
        let file = std::fs::File::create(path)?;
        tracks_file::write(file, &records)?;
    }

    if let Some(path) = &config.out_bb {
        let file = std::fs::File::create(path)?;
        bbox_file::write(file, tracker.bbox_log())?;
    }

    let meteor_count = tracker
        .tracks()
        .iter()
        .filter(|t| t.obj_type == ObjType::Meteor)
        .count();
    info!(meteor_count, "classification summary");

    Ok(())
}
