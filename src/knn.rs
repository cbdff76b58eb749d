//! Nearest-neighbor association between two consecutive frames' ROI sets.
//!
//! Each source ROI ranks candidates by centroid distance and proposes its
//! nearest; proposals that collide on the same target are resolved by
//! distance with ties broken by the lower source id, and the loser advances
//! to its next-nearest candidate. A link is only committed if it is mutual:
//! running the same process from the target side must also propose back to
//! the source.

use crate::roi::Roi;

fn centroid_distance(a: &Roi, b: &Roi) -> f64 {
    let (ax, ay) = a.centroid();
    let (bx, by) = b.centroid();
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

/// For every ROI in `sources`, its candidates in `targets` ranked by
/// ascending centroid distance, truncated to `k`.
fn ranked_neighbors(sources: &[Roi], targets: &[Roi], k: usize) -> Vec<Vec<usize>> {
    sources
        .iter()
        .map(|s| {
            let mut idx: Vec<usize> = (0..targets.len()).collect();
            idx.sort_by(|&i, &j| {
                centroid_distance(s, &targets[i])
                    .partial_cmp(&centroid_distance(s, &targets[j]))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            idx.truncate(k);
            idx
        })
        .collect()
}

/// Resolve one-to-one associations from `sources[i]` (index space) to
/// `targets[j]` by mutual nearest neighbor, using each side's `k`-nearest
/// candidate list and conflict resolution by distance/lower-id tiebreak.
///
/// Returns `(source_to_target, target_to_source)`, both index-space maps
/// where an unset entry is `None`. If either side is empty, both maps are
/// all-`None` (not an error).
pub fn associate(sources: &[Roi], targets: &[Roi], k: usize) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let m = sources.len();
    let n = targets.len();
    let mut source_to_target = vec![None; m];
    let mut target_to_source = vec![None; n];

    if m == 0 || n == 0 {
        return (source_to_target, target_to_source);
    }

    let forward = ranked_neighbors(sources, targets, k);
    let backward = ranked_neighbors(targets, sources, k);

    // Each source's cursor into its own ranked candidate list; advances past
    // a candidate it loses a conflict for.
    let mut cursor = vec![0usize; m];
    let mut proposal: Vec<Option<usize>> = vec![None; m];
    for i in 0..m {
        proposal[i] = forward[i].first().copied();
    }

    loop {
        // Group unresolved proposals by target.
        let mut by_target: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
        for (i, p) in proposal.iter().enumerate() {
            if let Some(j) = p {
                by_target.entry(*j).or_default().push(i);
            }
        }

        let mut any_conflict = false;
        for (j, contenders) in by_target {
            if contenders.len() <= 1 {
                continue;
            }
            any_conflict = true;
            let winner = *contenders
                .iter()
                .min_by(|&&a, &&b| {
                    let da = centroid_distance(&sources[a], &targets[j]);
                    let db = centroid_distance(&sources[b], &targets[j]);
                    da.partial_cmp(&db)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(sources[a].id.cmp(&sources[b].id))
                })
                .unwrap();
            for i in contenders {
                if i == winner {
                    continue;
                }
                cursor[i] += 1;
                proposal[i] = forward[i].get(cursor[i]).copied();
            }
        }

        if !any_conflict {
            break;
        }
    }

    for (i, p) in proposal.into_iter().enumerate() {
        let Some(j) = p else { continue };
        // Reciprocity: does target j's own ranked list propose back to i?
        if backward[j].first().copied() == Some(i) {
            source_to_target[i] = Some(j);
            target_to_source[j] = Some(i);
        }
    }

    (source_to_target, target_to_source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roi_at(id: u32, x: f64, y: f64) -> Roi {
        Roi {
            id,
            xmin: 0,
            xmax: 0,
            ymin: 0,
            ymax: 0,
            s: 1.0,
            sx: x,
            sy: y,
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

    #[test]
    fn empty_either_side_yields_no_associations() {
        let (s2t, t2s) = associate(&[], &[roi_at(1, 0.0, 0.0)], 3);
        assert!(s2t.is_empty());
        assert_eq!(t2s, vec![None]);

        let (s2t, t2s) = associate(&[roi_at(1, 0.0, 0.0)], &[], 3);
        assert_eq!(s2t, vec![None]);
        assert!(t2s.is_empty());
    }

    #[test]
    fn unique_nearest_neighbors_link_mutually() {
        let sources = vec![roi_at(1, 0.0, 0.0), roi_at(2, 10.0, 10.0)];
        let targets = vec![roi_at(1, 0.5, 0.5), roi_at(2, 10.5, 10.5)];
        let (s2t, t2s) = associate(&sources, &targets, 3);
        assert_eq!(s2t, vec![Some(0), Some(1)]);
        assert_eq!(t2s, vec![Some(0), Some(1)]);
    }

    #[test]
    fn conflicting_proposals_resolve_to_the_closer_source() {
        // Two sources both want target 0; source 0 is closer.
        let sources = vec![roi_at(1, 0.0, 0.0), roi_at(2, 1.0, 0.0)];
        let targets = vec![roi_at(1, 0.1, 0.0), roi_at(2, 100.0, 100.0)];
        let (s2t, _) = associate(&sources, &targets, 2);
        assert_eq!(s2t[0], Some(0));
        // the loser falls through to its next candidate.
        assert_eq!(s2t[1], Some(1));
    }

    #[test]
    fn non_reciprocal_nearest_neighbor_is_left_unassociated() {
        // A's nearest target is T, but B is closer to T than A is (B just
        // prefers its own even-closer target T'), so T's own nearest-source
        // list points back to B, not A: the A-T proposal is not mutual.
        let sources = vec![roi_at(1, 0.0, 0.0), roi_at(2, 5.0, 1.0)];
        let targets = vec![roi_at(1, 5.0, 0.0), roi_at(2, 5.0, 1.5)];
        let (s2t, t2s) = associate(&sources, &targets, 2);
        assert_eq!(s2t[0], None);
        assert_eq!(s2t[1], Some(1));
        assert_eq!(t2s[0], None);
        assert_eq!(t2s[1], Some(1));
    }
}
