//! Six-band equalizer parameter model
//!
//! Holds, validates, and compares per-band gain values. Gains are stored
//! metadata attached to a recording: they are persisted, diffed against a
//! saved snapshot, and summarized for display, but never applied to the
//! played samples.
//!
//! The canonical unit is decibels (±12 dB per band). Percentage-style UIs
//! go through the `percent`/`set_percent` transform rather than a second
//! domain model.

mod presets;

pub use presets::{preset, Preset, PresetId};

/// Number of equalizer bands
pub const BAND_COUNT: usize = 6;

/// Neutral per-band gain: a band at this value does nothing.
pub const NEUTRAL_GAIN_DB: f32 = 0.0;

/// A band counts toward the tone summary once it deviates this far from
/// neutral.
const SIGNIFICANT_GAIN_DB: f32 = 1.0;

/// Tolerance for flat/dirty comparisons (well below the 0.5 dB step).
const GAIN_EPSILON: f32 = 0.01;

/// Fixed frequency bands, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Bass,
    LowMid,
    Mid,
    HighMid,
    High,
    Presence,
}

impl Band {
    /// All bands in declaration (frequency) order
    pub const ALL: [Band; BAND_COUNT] = [
        Band::Bass,
        Band::LowMid,
        Band::Mid,
        Band::HighMid,
        Band::High,
        Band::Presence,
    ];

    /// Center frequency label for display
    pub fn display_frequency(&self) -> &'static str {
        match self {
            Band::Bass => "60 Hz",
            Band::LowMid => "230 Hz",
            Band::Mid => "910 Hz",
            Band::HighMid => "3.6 kHz",
            Band::High => "8 kHz",
            Band::Presence => "14 kHz",
        }
    }

    /// Stable key used for persistence
    pub fn key(&self) -> &'static str {
        match self {
            Band::Bass => "bass",
            Band::LowMid => "low_mid",
            Band::Mid => "mid",
            Band::HighMid => "high_mid",
            Band::High => "high",
            Band::Presence => "presence",
        }
    }

    /// Reverse of [`Band::key`]; unknown keys yield None
    pub fn from_key(key: &str) -> Option<Band> {
        Band::ALL.into_iter().find(|b| b.key() == key)
    }

    /// Allowed gain range in dB
    pub fn gain_range(&self) -> (f32, f32) {
        (-12.0, 12.0)
    }

    /// Adjustment step in dB
    pub fn step(&self) -> f32 {
        0.5
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Overall tonal classification for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneSummary {
    Flat,
    SubtleAdjustments,
    TargetedBoost,
    FullProfile,
}

impl ToneSummary {
    pub fn label(&self) -> &'static str {
        match self {
            ToneSummary::Flat => "Flat",
            ToneSummary::SubtleAdjustments => "Subtle adjustments",
            ToneSummary::TargetedBoost => "Targeted boost",
            ToneSummary::FullProfile => "Full profile",
        }
    }
}

/// Per-band gain map for one recording.
///
/// Plain value type: the UI keeps a working copy and diffs it against the
/// persisted snapshot, so no aliasing between the two is possible.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerSettings {
    gains: [f32; BAND_COUNT],
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            gains: [NEUTRAL_GAIN_DB; BAND_COUNT],
        }
    }
}

impl EqualizerSettings {
    /// Flat settings (all bands neutral)
    pub fn flat() -> Self {
        Self::default()
    }

    /// Current gain for a band, in dB
    pub fn gain(&self, band: Band) -> f32 {
        self.gains[band.index()]
    }

    /// Set a band's gain. Out-of-range values are clamped into the
    /// band's range; an in-range value is stored unchanged.
    pub fn set_gain(&mut self, band: Band, gain_db: f32) {
        let (min, max) = band.gain_range();
        self.gains[band.index()] = gain_db.clamp(min, max);
    }

    /// Move a band's gain by a delta (clamped like `set_gain`)
    pub fn adjust_gain(&mut self, band: Band, delta_db: f32) {
        self.set_gain(band, self.gain(band) + delta_db);
    }

    /// Overwrite band values from a preset, in band declaration order.
    ///
    /// Bands beyond the preset's vector length are left unchanged.
    pub fn apply_preset(&mut self, preset: &Preset) {
        for (i, band) in Band::ALL.into_iter().enumerate() {
            if let Some(&gain) = preset.gains.get(i) {
                self.set_gain(band, gain);
            }
        }
    }

    /// True iff every band is at the neutral value
    pub fn is_flat(&self) -> bool {
        self.gains
            .iter()
            .all(|g| (g - NEUTRAL_GAIN_DB).abs() <= GAIN_EPSILON)
    }

    /// True iff any band differs from the saved snapshot
    pub fn is_dirty(&self, saved: &EqualizerSettings) -> bool {
        self.gains
            .iter()
            .zip(saved.gains.iter())
            .any(|(a, b)| (a - b).abs() > GAIN_EPSILON)
    }

    /// Classify the overall tonal change by how many bands deviate
    /// meaningfully from neutral.
    pub fn summary(&self) -> ToneSummary {
        if self.is_flat() {
            return ToneSummary::Flat;
        }
        let significant = self
            .gains
            .iter()
            .filter(|g| (*g - NEUTRAL_GAIN_DB).abs() > SIGNIFICANT_GAIN_DB)
            .count();
        match significant {
            0 => ToneSummary::SubtleAdjustments,
            1 | 2 => ToneSummary::TargetedBoost,
            _ => ToneSummary::FullProfile,
        }
    }

    /// Band gain on a 0-100% scale (50% = neutral), for percentage UIs
    pub fn percent(&self, band: Band) -> f32 {
        let (min, max) = band.gain_range();
        (self.gain(band) - min) / (max - min) * 100.0
    }

    /// Set a band from a 0-100% value; out-of-range percentages clamp
    pub fn set_percent(&mut self, band: Band, percent: f32) {
        let (min, max) = band.gain_range();
        let t = (percent / 100.0).clamp(0.0, 1.0);
        self.set_gain(band, min + t * (max - min));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_flat() {
        let settings = EqualizerSettings::default();
        assert!(settings.is_flat());
        assert_eq!(settings.summary(), ToneSummary::Flat);
        for band in Band::ALL {
            assert_eq!(settings.gain(band), NEUTRAL_GAIN_DB);
        }
    }

    #[test]
    fn test_set_gain_clamps() {
        let mut settings = EqualizerSettings::default();

        settings.set_gain(Band::Bass, 40.0);
        assert_eq!(settings.gain(Band::Bass), 12.0);

        settings.set_gain(Band::Bass, -40.0);
        assert_eq!(settings.gain(Band::Bass), -12.0);

        // In-range write is untouched; clamping again is a no-op.
        settings.set_gain(Band::Bass, 3.5);
        assert_eq!(settings.gain(Band::Bass), 3.5);
        settings.set_gain(Band::Bass, settings.gain(Band::Bass));
        assert_eq!(settings.gain(Band::Bass), 3.5);
    }

    #[test]
    fn test_single_band_breaks_flat() {
        let mut settings = EqualizerSettings::default();
        settings.set_gain(Band::Mid, 0.5);
        assert!(!settings.is_flat());
    }

    #[test]
    fn test_dirty_against_snapshot() {
        let saved = EqualizerSettings::default();
        let mut working = saved.clone();
        assert!(!working.is_dirty(&saved));

        working.adjust_gain(Band::High, 0.5);
        assert!(working.is_dirty(&saved));

        working.adjust_gain(Band::High, -0.5);
        assert!(!working.is_dirty(&saved));
    }

    #[test]
    fn test_summary_classification() {
        // One significant band -> targeted boost.
        let mut settings = EqualizerSettings::default();
        settings.set_gain(Band::Bass, 8.0);
        assert_eq!(settings.summary(), ToneSummary::TargetedBoost);

        // A second significant band stays targeted.
        settings.set_gain(Band::Presence, -2.0);
        assert_eq!(settings.summary(), ToneSummary::TargetedBoost);

        // Three or more -> full profile.
        settings.set_gain(Band::Mid, 1.5);
        assert_eq!(settings.summary(), ToneSummary::FullProfile);

        // Non-flat but nothing past the threshold -> subtle.
        let mut subtle = EqualizerSettings::default();
        subtle.set_gain(Band::LowMid, 0.5);
        assert_eq!(subtle.summary(), ToneSummary::SubtleAdjustments);
    }

    #[test]
    fn test_apply_preset_clears_dirty() {
        let preset = preset(PresetId::Voice);
        let mut working = EqualizerSettings::default();
        working.set_gain(Band::Bass, -6.0);

        working.apply_preset(preset);
        assert!(!working.is_dirty(&preset.as_settings()));
    }

    #[test]
    fn test_apply_short_preset_leaves_tail_unchanged() {
        let short = Preset {
            name: "Short",
            icon: "dot",
            description: "only touches the low bands",
            gains: &[2.0, 1.0],
        };

        let mut settings = EqualizerSettings::default();
        settings.set_gain(Band::Presence, 4.0);
        settings.apply_preset(&short);

        assert_eq!(settings.gain(Band::Bass), 2.0);
        assert_eq!(settings.gain(Band::LowMid), 1.0);
        assert_eq!(settings.gain(Band::Presence), 4.0);
    }

    #[test]
    fn test_percent_transform() {
        let mut settings = EqualizerSettings::default();
        assert_eq!(settings.percent(Band::Mid), 50.0);

        settings.set_percent(Band::Mid, 100.0);
        assert_eq!(settings.gain(Band::Mid), 12.0);

        settings.set_percent(Band::Mid, 0.0);
        assert_eq!(settings.gain(Band::Mid), -12.0);

        // Overshoot clamps instead of escaping the range.
        settings.set_percent(Band::Mid, 130.0);
        assert_eq!(settings.gain(Band::Mid), 12.0);
    }

    #[test]
    fn test_band_keys_round_trip() {
        for band in Band::ALL {
            assert_eq!(Band::from_key(band.key()), Some(band));
        }
        assert_eq!(Band::from_key("sub_bass"), None);
    }
}
