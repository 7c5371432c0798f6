//! Audio engine - command/event plumbing between UI and audio threads
//!
//! The UI thread sends [`AudioCommand`]s over a bounded channel; the
//! audio thread owns an [`EngineState`], dispatches commands, and sends
//! [`AudioEvent`]s back. Scrub gestures and equalizer edits all flow
//! through here so the player is only ever touched from one thread.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::warn;

use atx_analysis::WaveformOverview;

use crate::equalizer::{preset, Band, EqualizerSettings, PresetId};
use crate::player::{Player, PlayerState};
use crate::scrub::{FeedbackSink, NullFeedback, ScrubEngine, ScrubMode};

/// Channel capacity for commands and events
const CHANNEL_CAPACITY: usize = 64;

/// Commands sent to the audio engine
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Load a decoded recording (samples, sample rate, title, overview)
    Load(Arc<Vec<f32>>, u32, Option<String>, Arc<WaveformOverview>),

    // Transport
    Play,
    Pause,
    Toggle,
    Stop,
    Seek(f64),
    Nudge(f64),
    SetRate(f32),
    SetGain(f32),

    // Scrub gestures
    BeginScrub(ScrubMode),
    ScrubAngle(f32),
    ScrubFlick { position: f64, velocity: f32 },
    EndScrub,

    // Equalizer (metadata only - gains are never applied to samples)
    SetBandGain(Band, f32),
    AdjustBandGain(Band, f32),
    ApplyPreset(PresetId),
    SetEqualizer(EqualizerSettings),
    ResetEqualizer,

    // System
    Shutdown,
}

/// Events sent from the audio engine
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// Periodic state snapshot for UI rendering
    State(Box<PlayerState>),
    /// A scrub gesture crossed a detent boundary (haptic tick)
    DetentCrossed,
    /// The working equalizer changed (for dirty tracking)
    EqualizerChanged(EqualizerSettings),
    /// Error surfaced to the UI
    Error(String),
}

/// Engine state held by the audio thread
pub struct EngineState {
    player: Player,
    scrub: ScrubEngine,
    equalizer: EqualizerSettings,
    feedback: Box<dyn FeedbackSink + Send>,
}

impl EngineState {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_feedback(sample_rate, Box::new(NullFeedback))
    }

    /// Engine with an injected haptics capability
    pub fn with_feedback(sample_rate: u32, feedback: Box<dyn FeedbackSink + Send>) -> Self {
        Self {
            player: Player::new(sample_rate),
            scrub: ScrubEngine::new(),
            equalizer: EqualizerSettings::flat(),
            feedback,
        }
    }

    pub fn equalizer(&self) -> &EqualizerSettings {
        &self.equalizer
    }

    /// Current player snapshot
    pub fn snapshot(&self) -> PlayerState {
        self.player.snapshot()
    }

    /// Fill an output buffer (called from the audio callback)
    pub fn process(&mut self, output: &mut [f32]) {
        self.player.process(output);
    }

    /// Dispatch one command, returning at most one event for the UI
    pub fn handle_command(&mut self, cmd: AudioCommand) -> Option<AudioEvent> {
        match cmd {
            AudioCommand::Load(samples, sample_rate, title, waveform) => {
                self.player.load(samples, sample_rate, title, waveform);
                None
            }

            AudioCommand::Play => {
                self.player.play();
                None
            }
            AudioCommand::Pause => {
                self.player.pause();
                None
            }
            AudioCommand::Toggle => {
                self.player.toggle();
                None
            }
            AudioCommand::Stop => {
                self.player.stop();
                None
            }
            AudioCommand::Seek(secs) => {
                self.player.seek(secs);
                None
            }
            AudioCommand::Nudge(delta) => {
                self.player.nudge(delta);
                None
            }
            AudioCommand::SetRate(rate) => {
                self.player.set_rate(rate);
                None
            }
            AudioCommand::SetGain(gain) => {
                self.player.set_gain(gain);
                None
            }

            AudioCommand::BeginScrub(mode) => {
                self.scrub.begin(
                    mode,
                    self.player.position_normalized(),
                    self.player.is_playing(),
                    self.player.duration_secs(),
                );
                None
            }
            AudioCommand::ScrubAngle(angle_deg) => match self.scrub.update_rotary(angle_deg) {
                Ok(update) => {
                    self.player.apply_scrub(&update);
                    if update.detent_crossed {
                        self.feedback.tick();
                        Some(AudioEvent::DetentCrossed)
                    } else {
                        None
                    }
                }
                Err(e) => Some(AudioEvent::Error(e.to_string())),
            },
            AudioCommand::ScrubFlick { position, velocity } => {
                match self.scrub.update_timeline(position, velocity) {
                    Ok(update) => {
                        self.player.apply_scrub(&update);
                        if update.detent_crossed {
                            self.feedback.tick();
                            Some(AudioEvent::DetentCrossed)
                        } else {
                            None
                        }
                    }
                    Err(e) => Some(AudioEvent::Error(e.to_string())),
                }
            }
            AudioCommand::EndScrub => match self.scrub.end() {
                Ok(end) => {
                    self.player.apply_scrub_end(&end);
                    self.feedback.impact(0.5);
                    None
                }
                Err(e) => Some(AudioEvent::Error(e.to_string())),
            },

            AudioCommand::SetBandGain(band, gain) => {
                self.equalizer.set_gain(band, gain);
                Some(AudioEvent::EqualizerChanged(self.equalizer.clone()))
            }
            AudioCommand::AdjustBandGain(band, delta) => {
                self.equalizer.adjust_gain(band, delta);
                Some(AudioEvent::EqualizerChanged(self.equalizer.clone()))
            }
            AudioCommand::ApplyPreset(id) => {
                self.equalizer.apply_preset(preset(id));
                Some(AudioEvent::EqualizerChanged(self.equalizer.clone()))
            }
            AudioCommand::SetEqualizer(settings) => {
                self.equalizer = settings;
                Some(AudioEvent::EqualizerChanged(self.equalizer.clone()))
            }
            AudioCommand::ResetEqualizer => {
                self.equalizer = EqualizerSettings::flat();
                Some(AudioEvent::EqualizerChanged(self.equalizer.clone()))
            }

            // Shutdown is handled by the thread loop, not the state.
            AudioCommand::Shutdown => None,
        }
    }
}

/// Handle held by the UI thread
pub struct AudioEngine {
    cmd_tx: Sender<AudioCommand>,
    evt_rx: Receiver<AudioEvent>,
}

impl AudioEngine {
    /// Create the bounded command/event channel pairs
    pub fn create_channels() -> (
        Sender<AudioCommand>,
        Receiver<AudioCommand>,
        Sender<AudioEvent>,
        Receiver<AudioEvent>,
    ) {
        let (cmd_tx, cmd_rx) = bounded(CHANNEL_CAPACITY);
        let (evt_tx, evt_rx) = bounded(CHANNEL_CAPACITY);
        (cmd_tx, cmd_rx, evt_tx, evt_rx)
    }

    pub fn new(cmd_tx: Sender<AudioCommand>, evt_rx: Receiver<AudioEvent>) -> Self {
        Self { cmd_tx, evt_rx }
    }

    /// Send a command; a full channel drops the command with a warning
    /// rather than blocking the UI thread.
    pub fn send(&self, cmd: AudioCommand) {
        if let Err(e) = self.cmd_tx.try_send(cmd) {
            warn!("audio command dropped: {e}");
        }
    }

    /// Drain one pending event, if any
    pub fn poll_event(&self) -> Option<AudioEvent> {
        self.evt_rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn load_test_recording(state: &mut EngineState) {
        let samples: Vec<f32> = vec![0.1; 2000 * 2]; // 2 seconds at 1kHz
        state.handle_command(AudioCommand::Load(
            Arc::new(samples),
            1000,
            Some("memo".to_string()),
            Arc::new(WaveformOverview::default()),
        ));
    }

    #[test]
    fn test_transport_dispatch() {
        let mut state = EngineState::new(1000);
        load_test_recording(&mut state);

        state.handle_command(AudioCommand::Play);
        assert!(state.snapshot().playback == crate::player::PlaybackState::Playing);

        state.handle_command(AudioCommand::Seek(1.0));
        assert!((state.snapshot().position_secs - 1.0).abs() < 1e-9);

        state.handle_command(AudioCommand::Pause);
        assert!(state.snapshot().playback == crate::player::PlaybackState::Paused);
    }

    #[test]
    fn test_scrub_without_begin_reports_error() {
        let mut state = EngineState::new(1000);
        load_test_recording(&mut state);

        match state.handle_command(AudioCommand::ScrubAngle(45.0)) {
            Some(AudioEvent::Error(msg)) => assert!(msg.contains("no active scrub session")),
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[test]
    fn test_rotary_scrub_round_trip() {
        let mut state = EngineState::new(1000);
        load_test_recording(&mut state);
        state.handle_command(AudioCommand::Seek(1.0)); // position 0.5

        state.handle_command(AudioCommand::BeginScrub(ScrubMode::Rotary));
        state.handle_command(AudioCommand::ScrubAngle(0.0));
        state.handle_command(AudioCommand::ScrubAngle(90.0));
        state.handle_command(AudioCommand::EndScrub);

        // 360° + 90° = 450° -> position 0.625 of 2s = 1.25s
        assert!((state.snapshot().position_secs - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_detent_event_and_feedback() {
        static TICKS: AtomicUsize = AtomicUsize::new(0);

        struct CountingFeedback;
        impl FeedbackSink for CountingFeedback {
            fn tick(&mut self) {
                TICKS.fetch_add(1, Ordering::SeqCst);
            }
            fn impact(&mut self, _strength: f32) {}
        }

        let mut state = EngineState::with_feedback(1000, Box::new(CountingFeedback));
        load_test_recording(&mut state);
        state.handle_command(AudioCommand::Play);
        state.handle_command(AudioCommand::BeginScrub(ScrubMode::Timeline));

        let mut detents = 0;
        for pos in [0.04, 0.051, 0.06] {
            if let Some(AudioEvent::DetentCrossed) =
                state.handle_command(AudioCommand::ScrubFlick {
                    position: pos,
                    velocity: 0.0,
                })
            {
                detents += 1;
            }
        }

        assert_eq!(detents, 1);
        assert_eq!(TICKS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_equalizer_commands_emit_changes() {
        let mut state = EngineState::new(1000);

        let event = state.handle_command(AudioCommand::SetBandGain(Band::Bass, 8.0));
        match event {
            Some(AudioEvent::EqualizerChanged(eq)) => {
                assert_eq!(eq.gain(Band::Bass), 8.0);
            }
            _ => panic!("expected equalizer change event"),
        }

        state.handle_command(AudioCommand::ApplyPreset(PresetId::Voice));
        assert!(!state.equalizer().is_flat());

        state.handle_command(AudioCommand::ResetEqualizer);
        assert!(state.equalizer().is_flat());
    }

    #[test]
    fn test_channel_handle() {
        let (cmd_tx, cmd_rx, evt_tx, evt_rx) = AudioEngine::create_channels();
        let engine = AudioEngine::new(cmd_tx, evt_rx);

        engine.send(AudioCommand::Play);
        assert!(matches!(cmd_rx.try_recv(), Ok(AudioCommand::Play)));

        evt_tx.send(AudioEvent::DetentCrossed).unwrap();
        assert!(matches!(engine.poll_event(), Some(AudioEvent::DetentCrossed)));
        assert!(engine.poll_event().is_none());
    }
}
