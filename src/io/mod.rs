//! Text and CSV I/O for tracks, bounding boxes, and optional debug logs.

pub mod bbox_file;
pub mod csv_log;
pub mod tracks_file;
