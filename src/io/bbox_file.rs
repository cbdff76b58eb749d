//! Reading and writing the bounding-box text file: whitespace-separated
//! `frame rx ry bb_x bb_y track_id` per line, ordered by frame.

use crate::bbox::{BBoxLog, BBoxRecord};
use crate::error::{Error, Result};
use std::io::{BufRead, Write};

pub fn write<W: Write>(mut w: W, log: &BBoxLog) -> Result<()> {
    for r in log.records() {
        writeln!(w, "{} {} {} {} {} {}", r.frame, r.rx, r.ry, r.bb_x, r.bb_y, r.track_id)?;
    }
    Ok(())
}

pub fn read<R: BufRead>(r: R) -> Result<Vec<BBoxRecord>> {
    let mut out = Vec::new();
    for line in r.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(Error::ParseError(format!(
                "expected 6 fields in bounding-box file, got {}: {line:?}",
                fields.len()
            )));
        }
        let parse = |s: &str, what: &str| -> Result<u64> {
            s.parse()
                .map_err(|_| Error::ParseError(format!("bad {what}: {s:?}")))
        };
        out.push(BBoxRecord {
            frame: parse(fields[0], "frame")?,
            rx: parse(fields[1], "rx")? as u32,
            ry: parse(fields[2], "ry")? as u32,
            bb_x: parse(fields[3], "bb_x")? as u32,
            bb_y: parse(fields[4], "bb_y")? as u32,
            track_id: parse(fields[5], "track_id")? as u32,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_records_frame_ordered() {
        let mut log = BBoxLog::new();
        log.push(BBoxRecord {
            frame: 2,
            rx: 1,
            ry: 1,
            bb_x: 5,
            bb_y: 5,
            track_id: 1,
        });
        log.push(BBoxRecord {
            frame: 1,
            rx: 1,
            ry: 1,
            bb_x: 3,
            bb_y: 3,
            track_id: 1,
        });
        let mut buf = Vec::new();
        write(&mut buf, &log).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with('1'));
        assert!(lines[1].starts_with('2'));
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = read(std::io::Cursor::new(b"1 2 3\n".to_vec())).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
