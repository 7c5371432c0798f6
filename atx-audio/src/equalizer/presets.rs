//! Built-in equalizer presets
//!
//! Each preset is a fixed gain vector in band declaration order plus the
//! display metadata the preset picker shows.

use super::{Band, EqualizerSettings};

/// Built-in preset identifiers (1-5 in the picker)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetId {
    /// Everything neutral
    Flat = 1,
    /// Speech clarity - tamed lows, lifted upper mids
    Voice = 2,
    /// Softer top end, fuller lows
    Warm = 3,
    /// Airy top end for dull recordings
    Bright = 4,
    /// Low and high lift for quiet environments
    Loudness = 5,
}

impl PresetId {
    pub const ALL: [PresetId; 5] = [
        PresetId::Flat,
        PresetId::Voice,
        PresetId::Warm,
        PresetId::Bright,
        PresetId::Loudness,
    ];

    /// Picker slot (1-5) to preset id
    pub fn from_slot(slot: u8) -> Option<PresetId> {
        Self::ALL.get(slot.wrapping_sub(1) as usize).copied()
    }
}

/// A named, fixed vector of per-band gains plus display metadata
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    /// Gains in band declaration order; may be shorter than the band
    /// count, in which case trailing bands are left untouched.
    pub gains: &'static [f32],
}

impl Preset {
    /// Materialize the preset as a settings value (for dirty checks)
    pub fn as_settings(&self) -> EqualizerSettings {
        let mut settings = EqualizerSettings::flat();
        settings.apply_preset(self);
        settings
    }
}

const FLAT: Preset = Preset {
    name: "Flat",
    icon: "minus",
    description: "No tonal change",
    gains: &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
};

const VOICE: Preset = Preset {
    name: "Voice",
    icon: "mic",
    description: "Clearer speech with reduced rumble",
    gains: &[-3.0, -1.5, 1.0, 3.5, 2.5, 1.5],
};

const WARM: Preset = Preset {
    name: "Warm",
    icon: "sun",
    description: "Fuller lows and a softer top end",
    gains: &[3.0, 2.0, 0.5, -1.0, -1.5, -2.0],
};

const BRIGHT: Preset = Preset {
    name: "Bright",
    icon: "spark",
    description: "Extra air for dull recordings",
    gains: &[-1.5, -0.5, 0.5, 2.0, 3.0, 3.5],
};

const LOUDNESS: Preset = Preset {
    name: "Loudness",
    icon: "wave",
    description: "Lifted lows and highs for noisy listening",
    gains: &[4.0, 1.5, -1.0, 1.0, 3.0, 2.5],
};

/// Look up a built-in preset
pub fn preset(id: PresetId) -> &'static Preset {
    match id {
        PresetId::Flat => &FLAT,
        PresetId::Voice => &VOICE,
        PresetId::Warm => &WARM,
        PresetId::Bright => &BRIGHT,
        PresetId::Loudness => &LOUDNESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equalizer::ToneSummary;

    #[test]
    fn test_every_preset_covers_all_bands() {
        for id in PresetId::ALL {
            assert_eq!(preset(id).gains.len(), Band::ALL.len(), "{:?}", id);
        }
    }

    #[test]
    fn test_preset_gains_in_range() {
        for id in PresetId::ALL {
            for (i, band) in Band::ALL.into_iter().enumerate() {
                let (min, max) = band.gain_range();
                let gain = preset(id).gains[i];
                assert!(gain >= min && gain <= max, "{:?} {:?}", id, band);
            }
        }
    }

    #[test]
    fn test_flat_preset_is_flat() {
        assert!(preset(PresetId::Flat).as_settings().is_flat());
        assert_eq!(
            preset(PresetId::Flat).as_settings().summary(),
            ToneSummary::Flat
        );
    }

    #[test]
    fn test_slot_lookup() {
        assert_eq!(PresetId::from_slot(1), Some(PresetId::Flat));
        assert_eq!(PresetId::from_slot(5), Some(PresetId::Loudness));
        assert_eq!(PresetId::from_slot(0), None);
        assert_eq!(PresetId::from_slot(6), None);
    }
}
