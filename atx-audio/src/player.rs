//! Playback transport - owns the decoded recording and the playhead
//!
//! The player is the single consumer of scrub instructions: the scrub
//! engine computes positions and rates, and `apply_scrub` /
//! `apply_scrub_end` are where those instructions touch playback state.

use std::sync::Arc;
use std::time::Duration;

use atx_analysis::WaveformOverview;

use crate::scrub::{ScrubEnd, ScrubUpdate};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Snapshot of player state for the UI thread
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub playback: PlaybackState,
    pub position_secs: f64,
    pub position_normalized: f64,
    pub duration_secs: f64,
    pub rate: f32,
    pub gain: f32,
    pub peak_level: f32,
    pub is_clipping: bool,
    pub title: Option<String>,
    pub waveform: Arc<WaveformOverview>,
}

/// Audio playback for one loaded recording
pub struct Player {
    /// Interleaved stereo samples - Arc to avoid copying through channels
    samples: Arc<Vec<f32>>,
    /// Sample rate of the loaded recording
    sample_rate: u32,
    /// Playhead in interleaved sample units
    position: f64,
    state: PlaybackState,
    /// Playback rate (1.0 = normal)
    rate: f32,
    /// Output gain
    gain: f32,
    title: Option<String>,
    /// Pre-computed overview for display
    waveform: Arc<WaveformOverview>,
    /// Frames left before a scheduled preview stop pauses playback.
    /// At most one pending stop exists; rescheduling replaces it.
    preview_frames: Option<f64>,
    /// Smoothed peak level for metering
    peak_level: f32,
    is_clipping: bool,
}

impl Player {
    const RATE_MIN: f32 = 0.25;
    const RATE_MAX: f32 = 3.0;

    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(Vec::new()),
            sample_rate,
            position: 0.0,
            state: PlaybackState::Stopped,
            rate: 1.0,
            gain: 1.0,
            title: None,
            waveform: Arc::new(WaveformOverview::default()),
            preview_frames: None,
            peak_level: 0.0,
            is_clipping: false,
        }
    }

    /// Load a decoded recording into the player
    pub fn load(
        &mut self,
        samples: Arc<Vec<f32>>,
        sample_rate: u32,
        title: Option<String>,
        waveform: Arc<WaveformOverview>,
    ) {
        self.samples = samples;
        self.sample_rate = sample_rate;
        self.position = 0.0;
        self.state = PlaybackState::Stopped;
        self.rate = 1.0;
        self.title = title;
        self.waveform = waveform;
        self.preview_frames = None;
        self.peak_level = 0.0;
        self.is_clipping = false;
    }

    pub fn is_loaded(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn play(&mut self) {
        if self.is_loaded() {
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
    }

    /// Stop playback and reset the playhead
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.position = 0.0;
        self.preview_frames = None;
    }

    pub fn toggle(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.play(),
        }
    }

    /// Set playhead position in seconds
    pub fn seek(&mut self, position_secs: f64) {
        let max = self.samples.len() as f64;
        self.position = (position_secs * self.sample_rate as f64 * 2.0).clamp(0.0, max);
    }

    /// Set playhead position as a 0-1 fraction of the duration
    pub fn seek_normalized(&mut self, position: f64) {
        let duration = self.duration_secs();
        if duration <= 0.0 {
            return;
        }
        self.seek(position.clamp(0.0, 1.0) * duration);
    }

    /// Move the playhead by a delta in seconds
    pub fn nudge(&mut self, delta_secs: f64) {
        self.seek(self.position_secs() + delta_secs);
    }

    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(Self::RATE_MIN, Self::RATE_MAX);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 2.0);
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * 2.0) // stereo
    }

    pub fn position_secs(&self) -> f64 {
        self.position / (self.sample_rate as f64 * 2.0)
    }

    /// Playhead as a 0-1 fraction of the duration (0 when nothing loaded)
    pub fn position_normalized(&self) -> f64 {
        let duration = self.duration_secs();
        if duration <= 0.0 {
            return 0.0;
        }
        self.position_secs() / duration
    }

    /// Schedule playback to pause after the given duration.
    ///
    /// Replaces any pending stop; the countdown is decremented inside
    /// `process`, so the audio thread is the only scheduler.
    pub fn schedule_preview_stop(&mut self, duration: Duration) {
        self.preview_frames = Some(duration.as_secs_f64() * self.sample_rate as f64);
    }

    /// Drop any pending preview stop
    pub fn cancel_preview_stop(&mut self) {
        self.preview_frames = None;
    }

    pub fn has_pending_preview(&self) -> bool {
        self.preview_frames.is_some()
    }

    /// Apply one scrub update from the scrub engine
    pub fn apply_scrub(&mut self, update: &ScrubUpdate) {
        if let Some(position) = update.seek {
            self.seek_normalized(position);
        }
        if let Some(rate) = update.rate {
            self.set_rate(rate);
        }
        if let Some(duration) = update.preview {
            self.schedule_preview_stop(duration);
            self.play();
        }
    }

    /// Apply the final instruction of a scrub session.
    ///
    /// Any pending preview stop is cancelled unconditionally before the
    /// resume/pause policy takes effect.
    pub fn apply_scrub_end(&mut self, end: &ScrubEnd) {
        self.cancel_preview_stop();
        self.seek_normalized(end.position);
        self.set_rate(1.0);
        if end.resume {
            self.play();
        } else if self.state == PlaybackState::Playing {
            self.pause();
        }
    }

    /// Snapshot for the UI thread
    pub fn snapshot(&self) -> PlayerState {
        PlayerState {
            playback: self.state,
            position_secs: self.position_secs(),
            position_normalized: self.position_normalized(),
            duration_secs: self.duration_secs(),
            rate: self.rate,
            gain: self.gain,
            peak_level: self.peak_level,
            is_clipping: self.is_clipping,
            title: self.title.clone(),
            waveform: self.waveform.clone(),
        }
    }

    /// Fill an interleaved stereo output buffer.
    ///
    /// Advances the playhead by the playback rate with linear
    /// interpolation at non-integer positions, runs the preview-stop
    /// countdown, and tracks the peak level for metering.
    pub fn process(&mut self, output: &mut [f32]) {
        if self.state != PlaybackState::Playing || self.samples.is_empty() {
            output.fill(0.0);
            return;
        }

        let sample_count = self.samples.len();
        let mut current_peak = 0.0f32;

        for frame in output.chunks_mut(2) {
            if self.state != PlaybackState::Playing {
                frame.fill(0.0);
                continue;
            }

            if let Some(remaining) = self.preview_frames.as_mut() {
                if *remaining <= 0.0 {
                    self.preview_frames = None;
                    self.state = PlaybackState::Paused;
                    frame.fill(0.0);
                    continue;
                }
                *remaining -= 1.0;
            }

            let pos = self.position as usize;
            if pos + 1 >= sample_count {
                // End of recording
                self.state = PlaybackState::Stopped;
                self.position = 0.0;
                frame.fill(0.0);
                continue;
            }

            // Linear interpolation for smooth playback at non-integer
            // positions
            let frac = self.position.fract() as f32;
            let pos_even = pos & !1; // start at the left channel

            if pos_even + 3 < sample_count {
                let l0 = self.samples[pos_even];
                let r0 = self.samples[pos_even + 1];
                let l1 = self.samples[pos_even + 2];
                let r1 = self.samples[pos_even + 3];

                frame[0] = (l0 + frac * (l1 - l0)) * self.gain;
                frame[1] = (r0 + frac * (r1 - r0)) * self.gain;
            } else {
                frame[0] = self.samples[pos_even] * self.gain;
                frame[1] = self.samples[pos_even + 1] * self.gain;
            }

            current_peak = current_peak.max(frame[0].abs()).max(frame[1].abs());

            self.position += 2.0 * self.rate as f64;
        }

        self.peak_level = self.peak_level * 0.95 + current_peak * 0.05;
        self.is_clipping = current_peak > 0.99;
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(48000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrub::{ScrubEngine, ScrubMode};

    fn loaded_player(frames: usize, sample_rate: u32) -> Player {
        let mut player = Player::new(sample_rate);
        let samples: Vec<f32> = (0..frames * 2).map(|i| (i % 7) as f32 * 0.1).collect();
        player.load(
            Arc::new(samples),
            sample_rate,
            Some("memo".to_string()),
            Arc::new(WaveformOverview::default()),
        );
        player
    }

    #[test]
    fn test_play_requires_loaded() {
        let mut player = Player::new(48000);
        player.play();
        assert_eq!(player.snapshot().playback, PlaybackState::Stopped);

        let mut player = loaded_player(100, 48000);
        player.play();
        assert!(player.is_playing());
    }

    #[test]
    fn test_seek_clamps_to_recording() {
        let mut player = loaded_player(1000, 1000); // 1 second
        player.seek(0.5);
        assert!((player.position_secs() - 0.5).abs() < 1e-9);

        player.seek(99.0);
        assert!((player.position_secs() - 1.0).abs() < 1e-9);

        player.seek(-5.0);
        assert_eq!(player.position_secs(), 0.0);
    }

    #[test]
    fn test_seek_normalized_on_empty_is_noop() {
        let mut player = Player::new(48000);
        player.seek_normalized(0.5);
        assert_eq!(player.position_secs(), 0.0);
    }

    #[test]
    fn test_rate_clamping() {
        let mut player = loaded_player(100, 48000);
        player.set_rate(10.0);
        assert_eq!(player.rate(), 3.0);
        player.set_rate(0.0);
        assert_eq!(player.rate(), 0.25);
    }

    #[test]
    fn test_process_advances_position() {
        let mut player = loaded_player(1000, 1000);
        player.play();

        let mut buffer = vec![0.0f32; 200]; // 100 frames
        player.process(&mut buffer);

        assert!((player.position_secs() - 0.1).abs() < 1e-6);
        assert!(player.is_playing());
    }

    #[test]
    fn test_process_stops_at_end() {
        let mut player = loaded_player(50, 1000);
        player.play();

        let mut buffer = vec![0.0f32; 200];
        player.process(&mut buffer);

        assert_eq!(player.snapshot().playback, PlaybackState::Stopped);
        assert_eq!(player.position_secs(), 0.0);
    }

    #[test]
    fn test_preview_stop_pauses_after_countdown() {
        let mut player = loaded_player(1000, 1000);
        player.play();
        player.schedule_preview_stop(Duration::from_millis(50)); // 50 frames

        let mut buffer = vec![0.0f32; 200]; // 100 frames
        player.process(&mut buffer);

        assert_eq!(player.snapshot().playback, PlaybackState::Paused);
        assert!(!player.has_pending_preview());
        // Playhead stays where the preview ended instead of resetting.
        assert!(player.position_secs() > 0.0);
    }

    #[test]
    fn test_reschedule_replaces_pending_preview() {
        let mut player = loaded_player(1000, 1000);
        player.play();
        player.schedule_preview_stop(Duration::from_millis(10));
        player.schedule_preview_stop(Duration::from_millis(80));

        // 50 frames: the first schedule would already have paused, the
        // replacement keeps playing.
        let mut buffer = vec![0.0f32; 100];
        player.process(&mut buffer);
        assert!(player.is_playing());

        let mut buffer = vec![0.0f32; 100];
        player.process(&mut buffer);
        assert_eq!(player.snapshot().playback, PlaybackState::Paused);
    }

    #[test]
    fn test_scrub_end_cancels_preview_and_resumes() {
        let mut player = loaded_player(3000, 1000);
        player.play();

        let mut engine = ScrubEngine::new();
        engine.begin(
            ScrubMode::Timeline,
            player.position_normalized(),
            player.is_playing(),
            player.duration_secs(),
        );
        let update = engine.update_timeline(0.5, 1.0).unwrap();
        player.apply_scrub(&update);

        let end = engine.end().unwrap();
        player.apply_scrub_end(&end);

        assert!(!player.has_pending_preview());
        assert!(player.is_playing());
        assert_eq!(player.rate(), 1.0);
        assert!((player.position_normalized() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_scrub_end_pauses_when_started_paused() {
        let mut player = loaded_player(3000, 1000);

        let mut engine = ScrubEngine::new();
        engine.begin(ScrubMode::Timeline, 0.0, false, player.duration_secs());
        let update = engine.update_timeline(0.25, 2.0).unwrap();
        player.apply_scrub(&update);
        // Flick from paused starts a bounded preview.
        assert!(player.is_playing());
        assert!(player.has_pending_preview());

        let end = engine.end().unwrap();
        player.apply_scrub_end(&end);
        assert_eq!(player.snapshot().playback, PlaybackState::Paused);
        assert!(!player.has_pending_preview());
    }
}
