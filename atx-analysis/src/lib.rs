//! Audio analysis for AudioText
//!
//! Waveform overview generation: fixed-bucket downsampling with
//! dominant-frequency-band classification for display tinting.

mod waveform;

pub use waveform::{
    FrequencyBand, WaveformAnalyzer, WaveformOverview, WaveformPoint, OVERVIEW_POINTS,
};
