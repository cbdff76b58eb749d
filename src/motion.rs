//! Global motion estimator: fits a rigid 2-D rotation+translation to a set
//! of matched centroid pairs via a closed-form Kabsch/Umeyama fit, then
//! refits once more after dropping pairs whose first-pass residual is an
//! outlier.

use nalgebra::{Matrix2, Vector2};

/// Outlier threshold for the second pass, in standard deviations above the
/// mean first-pass residual.
pub const MOTION_OUTLIER_SIGMA: f64 = 3.0;

/// A rigid 2-D motion: rotation `theta` (radians) followed by translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub theta: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Motion {
    pub const IDENTITY: Motion = Motion {
        theta: 0.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Apply this motion to a point: `R(theta) * p + t`.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let (s, c) = self.theta.sin_cos();
        (c * x - s * y + self.tx, s * x + c * y + self.ty)
    }
}

/// Result of the two-pass motion fit.
#[derive(Clone, Debug)]
pub struct MotionEstimate {
    pub motion: Motion,
    pub first_mean_error: f64,
    pub first_std_deviation: f64,
    pub mean_error: f64,
    pub std_deviation: f64,
    /// Per-pair residual from the final pass, same order as the input pairs.
    pub errors: Vec<f64>,
}

fn fit_rigid(pairs: &[(f64, f64, f64, f64)]) -> Motion {
    let n = pairs.len() as f64;
    let (sum_ax, sum_ay, sum_bx, sum_by) = pairs.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sax, say, sbx, sby), &(ax, ay, bx, by)| (sax + ax, say + ay, sbx + bx, sby + by),
    );
    let centroid_a = Vector2::new(sum_ax / n, sum_ay / n);
    let centroid_b = Vector2::new(sum_bx / n, sum_by / n);

    let mut h = Matrix2::zeros();
    for &(ax, ay, bx, by) in pairs {
        let da = Vector2::new(ax, ay) - centroid_a;
        let db = Vector2::new(bx, by) - centroid_b;
        h += da * db.transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.unwrap();
    let v_t = svd.v_t.unwrap();
    let v = v_t.transpose();
    let d = if (v * u.transpose()).determinant() < 0.0 {
        -1.0
    } else {
        1.0
    };
    let correction = Matrix2::new(1.0, 0.0, 0.0, d);
    let r = v * correction * u.transpose();

    let t = centroid_b - r * centroid_a;
    let theta = r[(1, 0)].atan2(r[(0, 0)]);
    Motion {
        theta,
        tx: t.x,
        ty: t.y,
    }
}

fn residuals(motion: &Motion, pairs: &[(f64, f64, f64, f64)]) -> Vec<f64> {
    pairs
        .iter()
        .map(|&(ax, ay, bx, by)| {
            let (px, py) = motion.apply(ax, ay);
            ((px - bx).powi(2) + (py - by).powi(2)).sqrt()
        })
        .collect()
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Estimate global motion from matched centroid pairs `(ax, ay, bx, by)`.
/// Falls back to the identity motion with all-zero errors when fewer than
/// 3 pairs are given, since a rigid fit is underdetermined below that.
pub fn estimate(pairs: &[(f64, f64, f64, f64)]) -> MotionEstimate {
    if pairs.len() < 3 {
        return MotionEstimate {
            motion: Motion::IDENTITY,
            first_mean_error: 0.0,
            first_std_deviation: 0.0,
            mean_error: 0.0,
            std_deviation: 0.0,
            errors: vec![0.0; pairs.len()],
        };
    }

    let first_motion = fit_rigid(pairs);
    let first_errors = residuals(&first_motion, pairs);
    let (first_mean_error, first_std_deviation) = mean_std(&first_errors);

    let threshold = first_mean_error + MOTION_OUTLIER_SIGMA * first_std_deviation;
    let inliers: Vec<(f64, f64, f64, f64)> = pairs
        .iter()
        .zip(&first_errors)
        .filter(|(_, &e)| e <= threshold)
        .map(|(&p, _)| p)
        .collect();

    let motion = if inliers.len() >= 3 {
        fit_rigid(&inliers)
    } else {
        first_motion
    };
    let errors = residuals(&motion, pairs);
    let (mean_error, std_deviation) = mean_std(&errors);

    MotionEstimate {
        motion,
        first_mean_error,
        first_std_deviation,
        mean_error,
        std_deviation,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_three_pairs_falls_back_to_identity() {
        let est = estimate(&[(0.0, 0.0, 5.0, 5.0), (1.0, 1.0, 6.0, 6.0)]);
        assert_eq!(est.motion, Motion::IDENTITY);
        assert_eq!(est.errors, vec![0.0, 0.0]);
    }

    #[test]
    fn recovers_a_pure_translation() {
        let pairs: Vec<_> = (0..5)
            .map(|i| {
                let x = i as f64;
                let y = (i * 2) as f64;
                (x, y, x + 3.0, y - 1.0)
            })
            .collect();
        let est = estimate(&pairs);
        assert!((est.motion.theta).abs() < 1e-9);
        assert!((est.motion.tx - 3.0).abs() < 1e-6);
        assert!((est.motion.ty + 1.0).abs() < 1e-6);
        for e in &est.errors {
            assert!(e.abs() < 1e-6);
        }
    }

    #[test]
    fn recovers_a_pure_rotation_about_the_origin() {
        let theta = 0.2_f64;
        let (s, c) = theta.sin_cos();
        let pairs: Vec<_> = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (2.0, 3.0), (5.0, -2.0)]
            .iter()
            .map(|&(x, y)| (x, y, c * x - s * y, s * x + c * y))
            .collect();
        let est = estimate(&pairs);
        assert!((est.motion.theta - theta).abs() < 1e-6);
        assert!(est.motion.tx.abs() < 1e-6);
        assert!(est.motion.ty.abs() < 1e-6);
    }

    #[test]
    fn second_pass_excludes_a_first_pass_outlier() {
        let mut pairs: Vec<_> = (0..8)
            .map(|i| {
                let x = i as f64;
                (x, 0.0, x + 2.0, 0.0)
            })
            .collect();
        // one wild outlier pair inconsistent with the rest.
        pairs.push((100.0, 100.0, -500.0, 777.0));
        let est = estimate(&pairs);
        assert!((est.motion.tx - 2.0).abs() < 1e-3);
        assert!(est.mean_error < est.first_mean_error);
    }
}
