//! Timeline flick mapping
//!
//! A flick on the timeline carries a position and a gesture velocity. The
//! velocity magnitude maps to a transient playback rate, and when the
//! gesture began from a paused state it also bounds a short audible
//! preview so the user hears where they landed without committing to
//! continuous playback.

use std::time::Duration;

/// Detent spacing for timeline scrubbing, in normalized position units.
pub const TIMELINE_DETENT_SPACING: f64 = 0.05;

/// Velocity magnitudes are capped here before rate mapping.
pub const MAX_FLICK_VELOCITY: f32 = 3.0;

const RATE_MIN: f32 = 0.5;
const RATE_MAX: f32 = 3.0;
const RATE_PER_VELOCITY: f32 = 2.5;

const PREVIEW_BASE_SECS: f32 = 0.25;
const PREVIEW_SECS_PER_VELOCITY: f32 = 0.05;
const PREVIEW_MIN_SECS: f32 = 0.08;

/// Clamp a raw gesture velocity to its usable magnitude.
#[inline]
pub fn velocity_magnitude(velocity: f32) -> f32 {
    velocity.abs().clamp(0.0, MAX_FLICK_VELOCITY)
}

/// Playback rate for a capped velocity magnitude.
#[inline]
pub fn rate_for_velocity(magnitude: f32) -> f32 {
    (1.0 + magnitude * RATE_PER_VELOCITY).clamp(RATE_MIN, RATE_MAX)
}

/// Bounded preview duration for a capped velocity magnitude.
///
/// Faster flicks get shorter previews; the floor keeps even the fastest
/// flick audible.
#[inline]
pub fn preview_duration(magnitude: f32) -> Duration {
    let secs = (PREVIEW_BASE_SECS - magnitude * PREVIEW_SECS_PER_VELOCITY).max(PREVIEW_MIN_SECS);
    Duration::from_secs_f32(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_cap() {
        assert_eq!(velocity_magnitude(-5.0), 3.0);
        assert_eq!(velocity_magnitude(1.2), 1.2);
        assert_eq!(velocity_magnitude(0.0), 0.0);
    }

    #[test]
    fn test_rate_mapping() {
        // v=2 -> 1.0 + 2*2.5 = 6.0, clamped to 3.0
        assert_eq!(rate_for_velocity(2.0), 3.0);
        // v=0 -> 1.0 (no boost at rest)
        assert_eq!(rate_for_velocity(0.0), 1.0);
        // v=0.4 -> 2.0, inside the clamp window
        assert!((rate_for_velocity(0.4) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_preview_duration() {
        // v=2 -> max(0.08, 0.25 - 0.10) = 0.15s
        assert!((preview_duration(2.0).as_secs_f32() - 0.15).abs() < 1e-6);
        // v=0 -> full 0.25s
        assert!((preview_duration(0.0).as_secs_f32() - 0.25).abs() < 1e-6);
        // fastest allowed flick still clears the audibility floor
        assert!((preview_duration(3.0).as_secs_f32() - 0.10).abs() < 1e-6);
        assert!(preview_duration(MAX_FLICK_VELOCITY).as_secs_f32() >= PREVIEW_MIN_SECS);
    }
}
