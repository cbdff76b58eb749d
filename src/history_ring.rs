//! A fixed-capacity pool of `(prev_roi, cur_roi, frame)` triples, searched
//! linearly by `(roi_id, frame)` and eagerly reclaimed once entries age
//! past a configured horizon.

use crate::roi::Roi;

#[derive(Clone, Debug)]
struct Entry {
    prev: Roi,
    cur: Roi,
    frame: u64,
    occupied: bool,
}

pub struct HistoryRing {
    slots: Vec<Entry>,
}

impl HistoryRing {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![
                Entry {
                    prev: dummy_roi(),
                    cur: dummy_roi(),
                    frame: 0,
                    occupied: false,
                };
                capacity
            ],
        }
    }

    /// Insert into the first free slot. Returns `false` if the ring is full.
    #[must_use]
    pub fn insert(&mut self, prev: Roi, cur: Roi, frame: u64) -> bool {
        match self.slots.iter_mut().find(|e| !e.occupied) {
            Some(slot) => {
                slot.prev = prev;
                slot.cur = cur;
                slot.frame = frame;
                slot.occupied = true;
                true
            }
            None => false,
        }
    }

    /// Find the entry whose `cur` ROI has id `roi_id` and was observed on
    /// `frame`.
    pub fn find(&self, roi_id: u32, frame: u64) -> Option<(&Roi, &Roi)> {
        self.slots
            .iter()
            .find(|e| e.occupied && e.frame == frame && e.cur.id == roi_id)
            .map(|e| (&e.prev, &e.cur))
    }

    /// Walk back through the chain of matched ROIs starting at
    /// `(roi_id, frame)`, following `prev_id`/`frame - 1` links, collecting
    /// up to `max_len` `(prev, cur)` pairs, most recent first.
    pub fn walk_back(&self, roi_id: u32, frame: u64, max_len: usize) -> Vec<(Roi, Roi)> {
        let mut out = Vec::with_capacity(max_len);
        let mut cursor_id = roi_id;
        let mut cursor_frame = frame;
        while out.len() < max_len {
            let Some((prev, cur)) = self.find(cursor_id, cursor_frame) else {
                break;
            };
            out.push((prev.clone(), cur.clone()));
            if prev.id == 0 || cursor_frame == 0 {
                break;
            }
            cursor_id = prev.id;
            cursor_frame -= 1;
        }
        out
    }

    /// Evict every entry older than `max_age` frames relative to `now`.
    pub fn evict_older_than(&mut self, now: u64, max_age: u64) {
        for slot in &mut self.slots {
            if slot.occupied && now.saturating_sub(slot.frame) > max_age {
                slot.occupied = false;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|e| e.occupied).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

fn dummy_roi() -> Roi {
    Roi {
        id: 0,
        xmin: 0,
        xmax: 0,
        ymin: 0,
        ymax: 0,
        s: 0.0,
        sx: 0.0,
        sy: 0.0,
        prev_id: 0,
        next_id: 0,
        time: 0,
        time_motion: 0,
        is_extrapolated: false,
        frame: 0,
        track_id: 0,
        motion: false,
        error: 0.0,
    }
}
