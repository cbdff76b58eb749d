//! Reading and writing the tracks text file: one line per track,
//! whitespace-separated `id begin_frame end_frame obj_type [validity]`.

use crate::error::{Error, Result};
use crate::track::ObjType;
use std::io::{BufRead, Write};

#[derive(Clone, Debug, PartialEq)]
pub struct TrackRecord {
    pub id: u32,
    pub begin_frame: u64,
    pub end_frame: u64,
    pub obj_type: ObjType,
    pub validity: Option<i32>,
}

pub fn write<W: Write>(mut w: W, records: &[TrackRecord]) -> Result<()> {
    for r in records {
        match r.validity {
            Some(v) => writeln!(
                w,
                "{} {} {} {} {}",
                r.id,
                r.begin_frame,
                r.end_frame,
                r.obj_type.as_str(),
                v
            )?,
            None => writeln!(
                w,
                "{} {} {} {}",
                r.id, r.begin_frame, r.end_frame, r.obj_type.as_str()
            )?,
        }
    }
    Ok(())
}

pub fn read<R: BufRead>(r: R) -> Result<Vec<TrackRecord>> {
    let mut out = Vec::new();
    for line in r.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(Error::ParseError(format!(
                "expected at least 4 fields in tracks file, got {}: {line:?}",
                fields.len()
            )));
        }
        let id = fields[0]
            .parse()
            .map_err(|_| Error::ParseError(format!("bad track id: {:?}", fields[0])))?;
        let begin_frame = fields[1]
            .parse()
            .map_err(|_| Error::ParseError(format!("bad begin_frame: {:?}", fields[1])))?;
        let end_frame = fields[2]
            .parse()
            .map_err(|_| Error::ParseError(format!("bad end_frame: {:?}", fields[2])))?;
        let obj_type = ObjType::from_str(fields[3])
            .ok_or_else(|| Error::ParseError(format!("bad obj_type: {:?}", fields[3])))?;
        let validity = match fields.get(4) {
            Some(v) => Some(
                v.parse()
                    .map_err(|_| Error::ParseError(format!("bad validity: {v:?}")))?,
            ),
            None => None,
        };
        out.push(TrackRecord {
            id,
            begin_frame,
            end_frame,
            obj_type,
            validity,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_without_validity() {
        let records = vec![TrackRecord {
            id: 1,
            begin_frame: 0,
            end_frame: 9,
            obj_type: ObjType::Meteor,
            validity: None,
        }];
        let mut buf = Vec::new();
        write(&mut buf, &records).unwrap();
        let parsed = read(Cursor::new(buf)).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn round_trips_with_validity() {
        let records = vec![TrackRecord {
            id: 2,
            begin_frame: 5,
            end_frame: 20,
            obj_type: ObjType::Star,
            validity: Some(1),
        }];
        let mut buf = Vec::new();
        write(&mut buf, &records).unwrap();
        let parsed = read(Cursor::new(buf)).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn rejects_an_unknown_obj_type() {
        let err = read(Cursor::new(b"1 0 1 bogus\n".to_vec())).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
