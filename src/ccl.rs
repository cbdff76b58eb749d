//! Connected-component labeler.
//!
//! A two-pass union-find raster scan: a first pass assigns provisional
//! labels and records 4-connectivity equivalences between adjacent set
//! pixels, a second pass resolves equivalences and renumbers survivors
//! densely starting at 1.

use crate::frame::LumaFrame;
use crate::threshold::MASK_SET;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connected-component count {found} exceeds MAX_ROI ({max_roi})")]
    TooManyComponents { found: usize, max_roi: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A labeled image: `0` means background, `1..=n` are dense component ids.
pub struct Labeled {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    pub n: u32,
}

impl Labeled {
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, row: u32, col: u32) -> u32 {
        self.labels[(row * self.width + col) as usize]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.labels
    }
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        Self { parent: vec![0] } // slot 0 unused, labels are 1-based
    }

    fn make_set(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            self.parent[x as usize] = self.parent[self.parent[x as usize] as usize];
            x = self.parent[x as usize];
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // lower id becomes the representative, for determinism.
            if ra < rb {
                self.parent[rb as usize] = ra;
            } else {
                self.parent[ra as usize] = rb;
            }
        }
    }
}

/// Label the 4-connected components of `mask` (a binary mask as produced by
/// `threshold::threshold`, `MASK_SET` pixels are foreground). Fails if the
/// resulting component count exceeds `max_roi`.
pub fn label(mask: &LumaFrame, max_roi: usize) -> Result<Labeled> {
    let w = mask.width();
    let h = mask.height();
    let mut provisional = vec![0u32; (w * h) as usize];
    let mut uf = UnionFind::new();

    for row in 0..h {
        for col in 0..w {
            let idx = (row * w + col) as usize;
            if mask.get(row, col) != MASK_SET {
                continue;
            }
            let up = if row > 0 {
                provisional[idx - w as usize]
            } else {
                0
            };
            let left = if col > 0 { provisional[idx - 1] } else { 0 };

            let label = match (up, left) {
                (0, 0) => uf.make_set(),
                (0, l) => l,
                (u, 0) => u,
                (u, l) => {
                    uf.union(u, l);
                    u.min(l)
                }
            };
            provisional[idx] = label;
        }
    }

    let mut canon_of_root: std::collections::HashMap<u32, u32> = std::collections::HashMap::new();
    let mut next_id = 1u32;
    let mut labels = vec![0u32; (w * h) as usize];
    for (idx, &p) in provisional.iter().enumerate() {
        if p == 0 {
            continue;
        }
        let root = uf.find(p);
        let canon = *canon_of_root.entry(root).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        labels[idx] = canon;
    }

    let n = (next_id - 1) as usize;
    if n > max_roi {
        return Err(Error::TooManyComponents {
            found: n,
            max_roi,
        });
    }

    Ok(Labeled {
        width: w,
        height: h,
        labels,
        n: n as u32,
    })
}
