//! Thresholder: pure, stateless. Two instances run with `tau_low < tau_high`
//! over the same frame to produce a hysteresis pair.

use crate::frame::LumaFrame;

/// Mask value written where a pixel's luminance is `>= tau`.
pub const MASK_SET: u8 = 255;
pub const MASK_CLEAR: u8 = 0;

/// Apply a single threshold `tau`, emitting a binary mask the same
/// dimensions as `frame`.
pub fn threshold(frame: &LumaFrame, tau: u8) -> LumaFrame {
    let mut out = LumaFrame::zeros(frame.width(), frame.height());
    for (dst, &src) in out.data_mut().iter_mut().zip(frame.data()) {
        *dst = if src >= tau { MASK_SET } else { MASK_CLEAR };
    }
    out
}

/// Apply the low/high hysteresis pair in one pass over the frame.
pub fn threshold_pair(frame: &LumaFrame, tau_low: u8, tau_high: u8) -> (LumaFrame, LumaFrame) {
    debug_assert!(tau_low < tau_high);
    (threshold(frame, tau_low), threshold(frame, tau_high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_at_boundary_inclusive() {
        let frame = LumaFrame::new(3, 1, vec![54, 55, 56]).unwrap();
        let mask = threshold(&frame, 55);
        assert_eq!(mask.data(), &[MASK_CLEAR, MASK_SET, MASK_SET]);
    }

    #[test]
    fn pair_produces_independent_masks() {
        let frame = LumaFrame::new(1, 3, vec![10, 60, 90]).unwrap();
        let (low, high) = threshold_pair(&frame, 55, 80);
        assert_eq!(low.data(), &[MASK_CLEAR, MASK_SET, MASK_SET]);
        assert_eq!(high.data(), &[MASK_CLEAR, MASK_CLEAR, MASK_SET]);
    }
}
