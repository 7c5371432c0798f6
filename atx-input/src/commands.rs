//! Command definitions for AudioText

// Re-export the audio types that commands carry
pub use atx_audio::{Band, PresetId, ScrubMode};

/// Commands dispatched from input handling.
///
/// Scrub flicks are relative (`delta` against the current playhead)
/// because the handler does not track playback position; the app
/// resolves them against the latest player snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Transport
    TogglePlayback,
    Stop,
    Nudge(f64),
    AdjustRate(f32),

    // Scrub gestures
    BeginScrub(ScrubMode),
    ScrubAngle(f32), // absolute pointer angle in degrees (±180 convention)
    ScrubFlick { delta: f64, velocity: f32 },
    EndScrub,

    // Equalizer
    AdjustBand(Band, f32),
    SetBandGain(Band, f32),
    ApplyPreset(PresetId),
    ResetEqualizer,
    SaveEqualizer,

    // Library
    Rename(String),

    // Application
    Quit,
    Cancel,
}
