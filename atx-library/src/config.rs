//! Simple configuration persistence for AudioText
//!
//! Stores user preferences like the recordings folder and the last
//! opened recording.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Default, PartialEq)]
pub struct Config {
    /// Folder where recordings live
    pub recordings_dir: Option<PathBuf>,
    /// Identifier of the recording that was open last
    pub last_recording: Option<String>,
    /// Preset applied to new recordings
    pub default_preset: Option<String>,
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.serialize();
        fs::write(path, content)
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("atx")
            .join("config.txt")
    }

    /// Parse config from simple key=value format
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }

                match key {
                    "recordings_dir" => config.recordings_dir = Some(PathBuf::from(value)),
                    "last_recording" => config.last_recording = Some(value.to_string()),
                    "default_preset" => config.default_preset = Some(value.to_string()),
                    _ => {} // Ignore unknown keys
                }
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let mut lines = Vec::new();
        lines.push("# AudioText Configuration".to_string());

        if let Some(ref dir) = self.recordings_dir {
            lines.push(format!("recordings_dir={}", dir.display()));
        }
        if let Some(ref id) = self.last_recording {
            lines.push(format!("last_recording={}", id));
        }
        if let Some(ref preset) = self.default_preset {
            lines.push(format!("default_preset={}", preset));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let config = Config::parse("");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let content = "recordings_dir=/home/user/recordings\nlast_recording=rec-7\ndefault_preset=Voice";
        let config = Config::parse(content);
        assert_eq!(
            config.recordings_dir,
            Some(PathBuf::from("/home/user/recordings"))
        );
        assert_eq!(config.last_recording.as_deref(), Some("rec-7"));
        assert_eq!(config.default_preset.as_deref(), Some("Voice"));
    }

    #[test]
    fn test_parse_skips_comments_and_unknown_keys() {
        let content = "# Comment\nlast_recording=rec-1\nmystery_key=42\n# trailing";
        let config = Config::parse(content);
        assert_eq!(config.last_recording.as_deref(), Some("rec-1"));
        assert!(config.recordings_dir.is_none());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = Config {
            recordings_dir: Some(PathBuf::from("/voice/notes")),
            last_recording: Some("rec-3".to_string()),
            default_preset: Some("Warm".to_string()),
        };

        let parsed = Config::parse(&config.serialize());
        assert_eq!(parsed, config);
    }
}
