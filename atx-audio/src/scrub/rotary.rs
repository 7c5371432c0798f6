//! Rotary gesture arithmetic
//!
//! A rotary scrub maps a circular pointer drag onto two full logical turns
//! (720°) of travel, giving finer position resolution than a single turn.
//! Pointer angles arrive in the ±180° convention, so consecutive samples
//! that cross the boundary need shortest-path correction before they can
//! be accumulated.

/// Total logical rotation covered by a full scrub (two turns).
pub const TOTAL_ROTATION_DEG: f32 = 720.0;

/// Detent spacing for rotary scrubbing, in normalized position units.
pub const ROTARY_DETENT_SPACING: f64 = 0.01;

/// Signed angular delta between two pointer angles, corrected for the
/// ±180° wraparound.
///
/// Without this correction a drag crossing the boundary (e.g. 170° to
/// -170°) would read as a -340° jump instead of +20°.
#[inline]
pub fn wrap_delta(from_deg: f32, to_deg: f32) -> f32 {
    let mut delta = to_deg - from_deg;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Detent index for a normalized position at the given spacing.
///
/// Uses floor so jitter around a boundary cannot re-trigger the same
/// detent; only an actual crossing changes the index.
#[inline]
pub fn detent_index(position: f64, spacing: f64) -> i64 {
    (position / spacing).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_delta() {
        assert_eq!(wrap_delta(0.0, 90.0), 90.0);
        assert_eq!(wrap_delta(90.0, 30.0), -60.0);
    }

    #[test]
    fn test_wraparound_clockwise() {
        // 170° -> -170° crosses the boundary clockwise: +20°, not -340°.
        assert_eq!(wrap_delta(170.0, -170.0), 20.0);
    }

    #[test]
    fn test_wraparound_counterclockwise() {
        assert_eq!(wrap_delta(-170.0, 170.0), -20.0);
    }

    #[test]
    fn test_detent_index_floor() {
        assert_eq!(detent_index(0.04, 0.05), 0);
        assert_eq!(detent_index(0.051, 0.05), 1);
        assert_eq!(detent_index(0.06, 0.05), 1);
        assert_eq!(detent_index(0.0, 0.05), 0);
    }
}
