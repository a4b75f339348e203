//! Animator configuration, deserialized from TOML

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the pulse decay is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecayReference {
    /// Beats elapsed since the tile started pulsing; late tiles start fresh
    #[default]
    SinceSpawn,
    /// The song's beat count; every tile fades in lockstep
    SongBeat,
}

/// Where a tile's pulse cycle starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseAnchor {
    /// The cycle starts at rest when the tile is registered
    #[default]
    Spawn,
    /// The cycle follows the song beat, so late tiles join the shared pulse
    Song,
}

/// Latency compensation and drift correction for the beat clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Delay between reported playback position and audible output
    pub audio_latency_secs: f64,
    /// Delay between a drawn frame and it reaching the screen
    pub visual_latency_secs: f64,
    /// Drift (in beats) beyond which the clock jumps to the audio position
    pub resync_threshold_beats: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            audio_latency_secs: 0.0,
            visual_latency_secs: 0.0,
            resync_threshold_beats: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnimationConfig {
    pub decay_reference: DecayReference,
    pub phase_anchor: PhaseAnchor,
}

/// Complete animator configuration
///
/// ```toml
/// [clock]
/// audio_latency_secs = 0.05
/// resync_threshold_beats = 0.5
///
/// [animation]
/// decay_reference = "song_beat"
/// phase_anchor = "spawn"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnimatorConfig {
    pub clock: ClockConfig,
    pub animation: AnimationConfig,
}

impl AnimatorConfig {
    /// Parse and validate a configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: AnimatorConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check that latencies are finite and the resync threshold is non-negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        let clock = &self.clock;
        for (name, value) in [
            ("clock.audio_latency_secs", clock.audio_latency_secs),
            ("clock.visual_latency_secs", clock.visual_latency_secs),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }
        if !(clock.resync_threshold_beats.is_finite() && clock.resync_threshold_beats >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "clock.resync_threshold_beats must be >= 0, got {}",
                clock.resync_threshold_beats
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AnimatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnimatorConfig::default());
        assert_eq!(config.clock.resync_threshold_beats, 0.25);
        assert_eq!(config.animation.decay_reference, DecayReference::SinceSpawn);
        assert_eq!(config.animation.phase_anchor, PhaseAnchor::Spawn);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[clock]
audio_latency_secs = 0.05
visual_latency_secs = 0.02
resync_threshold_beats = 0.5

[animation]
decay_reference = "song_beat"
phase_anchor = "song"
"#;
        let config = AnimatorConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.clock.audio_latency_secs, 0.05);
        assert_eq!(config.clock.visual_latency_secs, 0.02);
        assert_eq!(config.clock.resync_threshold_beats, 0.5);
        assert_eq!(config.animation.decay_reference, DecayReference::SongBeat);
        assert_eq!(config.animation.phase_anchor, PhaseAnchor::Song);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = AnimatorConfig::from_toml_str("[clock]\naudio_latency_secs = 0.1\n").unwrap();
        assert_eq!(config.clock.audio_latency_secs, 0.1);
        assert_eq!(config.clock.resync_threshold_beats, 0.25);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = AnimatorConfig::from_toml_str("[clock]\nresync_threshold_beats = -1.0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AnimatorConfig::from_toml_str("[animation]\ndecay_reference = \"global\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse.toml");
        std::fs::write(&path, "[animation]\nphase_anchor = \"song\"\n").unwrap();

        let config = AnimatorConfig::load(&path).unwrap();
        assert_eq!(config.animation.phase_anchor, PhaseAnchor::Song);

        let missing = AnimatorConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
