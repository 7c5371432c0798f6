//! Playback engine for AudioText
//!
//! This crate provides the interactive core of the app:
//! - Scrub: gesture-to-position mapping (rotary knob and timeline flick)
//! - Equalizer: per-band gain model with presets and dirty tracking
//! - Player: playback transport with preview-stop scheduling
//! - Engine: command/event channels between the UI and audio threads

mod engine;
mod player;
pub mod equalizer;
pub mod scrub;

pub use engine::{AudioCommand, AudioEngine, AudioEvent, EngineState};
pub use equalizer::{preset, Band, EqualizerSettings, Preset, PresetId, ToneSummary};
pub use player::{PlaybackState, Player, PlayerState};
pub use scrub::{
    FeedbackSink, NullFeedback, ScrubEnd, ScrubEngine, ScrubError, ScrubMode, ScrubUpdate,
};
