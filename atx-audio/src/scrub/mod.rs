//! Interactive scrub engine
//!
//! Converts a continuous drag gesture into a normalized playback position
//! and auxiliary signals (transient rate, detent crossings, bounded
//! preview). The engine never touches the player: every update returns an
//! instruction record that the caller applies, which keeps the gesture
//! logic synchronous and testable.
//!
//! Two interpretations are supported:
//! - Rotary: a circular drag accumulates pointer angle into up to 720° of
//!   logical rotation, normalized to a 0-1 position.
//! - Timeline: drag position maps directly to a 0-1 position and the
//!   gesture velocity maps to a transient preview rate.
//!
//! Sessions are explicit. `begin` opens one, `update_*` mutates it, `end`
//! closes it; updates without a session are rejected rather than lazily
//! starting one.

mod flick;
mod rotary;

pub use flick::{MAX_FLICK_VELOCITY, TIMELINE_DETENT_SPACING};
pub use rotary::{ROTARY_DETENT_SPACING, TOTAL_ROTATION_DEG};

use std::time::Duration;

use thiserror::Error;

/// Errors from scrub operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrubError {
    #[error("no active scrub session")]
    NoActiveSession,
}

/// Gesture interpretation for a scrub session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrubMode {
    #[default]
    Rotary,
    Timeline,
}

/// Instructions produced by one scrub update, applied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrubUpdate {
    /// Normalized position to seek to, if the update moved the playhead
    pub seek: Option<f64>,
    /// Transient playback rate while the gesture is active
    pub rate: Option<f32>,
    /// True when this sample crossed a detent boundary (haptic tick)
    pub detent_crossed: bool,
    /// Bounded preview playback to schedule, after which the caller
    /// pauses again. At most one preview is pending at a time; a newer
    /// one replaces it.
    pub preview: Option<Duration>,
}

/// Final instruction produced when a scrub session ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrubEnd {
    /// Final normalized position
    pub position: f64,
    /// True if playback should resume at normal rate from the final
    /// position (the session started while playing); false pauses there.
    pub resume: bool,
}

/// Haptic/tick capability injected by the caller.
///
/// Replaces a global feedback singleton: the engine's owner decides what
/// a detent crossing feels like.
pub trait FeedbackSink {
    /// Light tick, fired on detent crossings.
    fn tick(&mut self);

    /// Stronger impact with a 0-1 strength, fired on gesture boundaries.
    fn impact(&mut self, strength: f32);
}

/// Feedback sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn tick(&mut self) {}
    fn impact(&mut self, _strength: f32) {}
}

/// Transient state for one continuous gesture
#[derive(Debug, Clone)]
struct ScrubSession {
    mode: ScrubMode,
    started_while_playing: bool,
    /// Duration of the underlying recording; a degenerate duration turns
    /// timeline updates into no-ops.
    duration_secs: f64,
    /// Accumulated logical rotation, clamped to [0, TOTAL_ROTATION_DEG]
    cumulative_rotation_deg: f32,
    /// Previous pointer angle; None until the first rotary sample sets
    /// the reference.
    last_angle_deg: Option<f32>,
    last_detent_index: i64,
    /// Most recent normalized position, reported by `end`
    last_position: f64,
}

/// Scrub gesture state machine: Idle -> Dragging -> Idle.
///
/// One session at a time; `begin` while a session is active is a no-op so
/// cumulative rotation is never double-initialized.
#[derive(Debug, Default)]
pub struct ScrubEngine {
    session: Option<ScrubSession>,
}

impl ScrubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a drag is currently active
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Mode of the active session, if any
    pub fn mode(&self) -> Option<ScrubMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    /// Open a session at the current playhead.
    ///
    /// Rotary sessions seed their cumulative rotation from the position
    /// so the knob picks up where the playhead is. Returns false (and
    /// changes nothing) if a session is already active.
    pub fn begin(
        &mut self,
        mode: ScrubMode,
        current_position: f64,
        is_playing: bool,
        duration_secs: f64,
    ) -> bool {
        if self.session.is_some() {
            return false;
        }

        let position = current_position.clamp(0.0, 1.0);
        let spacing = match mode {
            ScrubMode::Rotary => ROTARY_DETENT_SPACING,
            ScrubMode::Timeline => TIMELINE_DETENT_SPACING,
        };

        self.session = Some(ScrubSession {
            mode,
            started_while_playing: is_playing,
            duration_secs,
            cumulative_rotation_deg: (position as f32) * TOTAL_ROTATION_DEG,
            last_angle_deg: None,
            last_detent_index: rotary::detent_index(position, spacing),
            last_position: position,
        });
        true
    }

    /// Feed one rotary pointer angle (degrees, ±180° convention).
    ///
    /// The first sample after `begin` only establishes the reference
    /// angle; subsequent samples accumulate wraparound-corrected deltas.
    pub fn update_rotary(&mut self, angle_deg: f32) -> Result<ScrubUpdate, ScrubError> {
        let session = self.session.as_mut().ok_or(ScrubError::NoActiveSession)?;

        let delta = match session.last_angle_deg {
            Some(prev) => rotary::wrap_delta(prev, angle_deg),
            None => 0.0,
        };
        session.last_angle_deg = Some(angle_deg);

        session.cumulative_rotation_deg =
            (session.cumulative_rotation_deg + delta).clamp(0.0, TOTAL_ROTATION_DEG);
        let position = (session.cumulative_rotation_deg / TOTAL_ROTATION_DEG) as f64;
        session.last_position = position;

        let detent = rotary::detent_index(position, ROTARY_DETENT_SPACING);
        let crossed = detent != session.last_detent_index;
        session.last_detent_index = detent;

        Ok(ScrubUpdate {
            seek: Some(position),
            rate: None,
            detent_crossed: crossed,
            preview: None,
        })
    }

    /// Feed one timeline sample: a normalized position and the gesture
    /// velocity at that instant.
    ///
    /// When the session started from a paused state the update carries a
    /// bounded preview duration; the caller plays for that long and
    /// pauses again. A degenerate recording duration yields a neutral
    /// update (no seek, no rate change).
    pub fn update_timeline(
        &mut self,
        position: f64,
        velocity: f32,
    ) -> Result<ScrubUpdate, ScrubError> {
        let session = self.session.as_mut().ok_or(ScrubError::NoActiveSession)?;

        if session.duration_secs <= 0.0 {
            return Ok(ScrubUpdate::default());
        }

        let position = position.clamp(0.0, 1.0);
        session.last_position = position;

        let magnitude = flick::velocity_magnitude(velocity);
        let rate = flick::rate_for_velocity(magnitude);
        let preview =
            (!session.started_while_playing).then(|| flick::preview_duration(magnitude));

        let detent = rotary::detent_index(position, TIMELINE_DETENT_SPACING);
        let crossed = detent != session.last_detent_index;
        session.last_detent_index = detent;

        Ok(ScrubUpdate {
            seek: Some(position),
            rate: Some(rate),
            detent_crossed: crossed,
            preview,
        })
    }

    /// Close the session.
    ///
    /// The caller must cancel any pending preview stop unconditionally
    /// before applying the returned instruction.
    pub fn end(&mut self) -> Result<ScrubEnd, ScrubError> {
        let session = self.session.take().ok_or(ScrubError::NoActiveSession)?;
        Ok(ScrubEnd {
            position: session.last_position,
            resume: session.started_while_playing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_without_session_rejected() {
        let mut engine = ScrubEngine::new();
        assert_eq!(engine.update_rotary(10.0), Err(ScrubError::NoActiveSession));
        assert_eq!(
            engine.update_timeline(0.5, 1.0),
            Err(ScrubError::NoActiveSession)
        );
        assert_eq!(engine.end(), Err(ScrubError::NoActiveSession));
    }

    #[test]
    fn test_begin_is_idempotent() {
        let mut engine = ScrubEngine::new();
        assert!(engine.begin(ScrubMode::Rotary, 0.5, false, 10.0));
        // A second begin must not re-seed cumulative rotation.
        assert!(!engine.begin(ScrubMode::Rotary, 0.0, false, 10.0));

        engine.update_rotary(0.0).unwrap();
        let update = engine.update_rotary(90.0).unwrap();
        assert!((update.seek.unwrap() - 0.625).abs() < 1e-6);
    }

    #[test]
    fn test_rotary_sweep_from_center() {
        // Begin at position 0.5 (360° of 720°), sweep 0° -> 90°:
        // cumulative = 450°, position = 0.625.
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Rotary, 0.5, true, 30.0);

        let first = engine.update_rotary(0.0).unwrap();
        assert!((first.seek.unwrap() - 0.5).abs() < 1e-6);

        let update = engine.update_rotary(90.0).unwrap();
        assert!((update.seek.unwrap() - 0.625).abs() < 1e-6);
        assert!(update.rate.is_none());
        assert!(update.preview.is_none());
    }

    #[test]
    fn test_rotary_wraparound_accumulates_forward() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Rotary, 0.5, false, 30.0);
        engine.update_rotary(170.0).unwrap();
        let update = engine.update_rotary(-170.0).unwrap();
        // +20° on top of 360°, not -340°.
        assert!((update.seek.unwrap() - (380.0 / 720.0) as f64).abs() < 1e-6);
    }

    #[test]
    fn test_rotary_position_stays_normalized() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Rotary, 0.0, false, 30.0);
        engine.update_rotary(0.0).unwrap();

        // Grind backwards well past the stop, then forwards past the
        // other stop: position must stay in [0, 1] throughout.
        let mut angle = 0.0f32;
        for _ in 0..40 {
            angle -= 90.0;
            if angle <= -180.0 {
                angle += 360.0;
            }
            let update = engine.update_rotary(angle).unwrap();
            let pos = update.seek.unwrap();
            assert!((0.0..=1.0).contains(&pos));
        }
        for _ in 0..80 {
            angle += 90.0;
            if angle > 180.0 {
                angle -= 360.0;
            }
            let update = engine.update_rotary(angle).unwrap();
            let pos = update.seek.unwrap();
            assert!((0.0..=1.0).contains(&pos));
        }
    }

    #[test]
    fn test_timeline_detent_fires_once_per_crossing() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Timeline, 0.04, true, 30.0);

        let crossings: Vec<bool> = [0.04, 0.051, 0.06]
            .iter()
            .map(|&pos| engine.update_timeline(pos, 0.0).unwrap().detent_crossed)
            .collect();

        assert_eq!(crossings, vec![false, true, false]);
    }

    #[test]
    fn test_flick_rate_and_preview() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Timeline, 0.0, false, 30.0);

        let update = engine.update_timeline(0.3, 2.0).unwrap();
        assert_eq!(update.rate, Some(3.0));
        let preview = update.preview.expect("paused session previews");
        assert!((preview.as_secs_f32() - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_flick_while_playing_has_no_preview() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Timeline, 0.0, true, 30.0);

        let update = engine.update_timeline(0.3, 1.0).unwrap();
        assert!(update.preview.is_none());
        assert!(update.rate.is_some());
    }

    #[test]
    fn test_degenerate_duration_is_neutral() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Timeline, 0.0, false, 0.0);

        let update = engine.update_timeline(0.7, 2.0).unwrap();
        assert_eq!(update, ScrubUpdate::default());
    }

    #[test]
    fn test_timeline_position_clamped() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Timeline, 0.5, true, 30.0);

        assert_eq!(engine.update_timeline(1.7, 0.0).unwrap().seek, Some(1.0));
        assert_eq!(engine.update_timeline(-0.2, 0.0).unwrap().seek, Some(0.0));
    }

    #[test]
    fn test_end_reports_resume_policy() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Timeline, 0.1, true, 30.0);
        engine.update_timeline(0.4, 0.5).unwrap();
        let end = engine.end().unwrap();
        assert!((end.position - 0.4).abs() < 1e-9);
        assert!(end.resume);
        assert!(!engine.is_active());

        engine.begin(ScrubMode::Timeline, 0.1, false, 30.0);
        let end = engine.end().unwrap();
        assert!(!end.resume);
    }

    #[test]
    fn test_end_after_rotary_uses_final_position() {
        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Rotary, 0.25, false, 30.0);
        engine.update_rotary(0.0).unwrap();
        engine.update_rotary(180.0).unwrap(); // 180° + 180° seed = 360°
        let end = engine.end().unwrap();
        assert!((end.position - 0.5).abs() < 1e-6);
    }
}
