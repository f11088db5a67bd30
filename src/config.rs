//! Engine configuration.
//!
//! Everything has a default, so an empty TOML file (or no file at all) gives
//! the full instrument with a synthetic reverb and the two built-in sample
//! banks.

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use tracing::info;

use crate::{
    dsp::{envelope::EnvelopeShape, oscillator::Waveform},
    engine::params::EffectsParameters,
    error::ConfigError,
    io::samples::{SampleBank, SoundBank},
};

/// Which effect branches exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Topology {
    /// Filter, distortion, reverb and delay in parallel.
    #[default]
    Full,
    /// Reverb and delay only.
    Minimal,
}

/// Where the reverb impulse response comes from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum ImpulseSource {
    /// Decaying stereo noise burst.
    Synthetic { seconds: f32 },
    /// Audio file on disk.
    File { path: PathBuf },
    /// No reverb kernel; the branch stays silent.
    None,
}

impl Default for ImpulseSource {
    fn default() -> Self {
        ImpulseSource::Synthetic { seconds: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    pub topology: Topology,
    pub parameters: EffectsParameters,
    pub waveform: Waveform,
    pub envelope: EnvelopeShape,
    /// Glide time when a held note moves to another key.
    pub retune_time: f32,
    /// Capacity of the delay line in seconds.
    pub max_delay_time: f32,
    pub impulse: ImpulseSource,
    pub sound_banks: Vec<SampleBank>,
    /// Timbre selected at startup.
    pub sound_bank: SoundBank,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            topology: Topology::Full,
            parameters: EffectsParameters::default(),
            waveform: Waveform::Sine,
            envelope: EnvelopeShape::default(),
            retune_time: 0.1,
            max_delay_time: 5.0,
            impulse: ImpulseSource::default(),
            sound_banks: SampleBank::builtin(),
            sound_bank: SoundBank::Synth,
        }
    }
}

impl EngineConfig {
    /// The single-page instrument: reverb and delay only.
    pub fn minimal() -> Self {
        Self {
            topology: Topology::Minimal,
            ..Self::default()
        }
    }

    pub fn bank(&self, name: &str) -> Option<&SampleBank> {
        self.sound_banks.iter().find(|b| b.name == name)
    }

    /// Check cross-field references and clamp parameters.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if let SoundBank::Samples(name) = &self.sound_bank {
            if self.bank(name).is_none() {
                return Err(ConfigError::UnknownBank(name.clone()));
            }
        }
        if !(self.max_delay_time.is_finite() && self.max_delay_time >= 0.0) {
            self.max_delay_time = Self::default().max_delay_time;
        }
        if !(self.retune_time.is_finite() && self.retune_time >= 0.0) {
            self.retune_time = Self::default().retune_time;
        }
        self.parameters = self.parameters.clamped(self.max_delay_time);
        Ok(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()
    }

    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), topology = ?config.topology, "Loaded configuration");
        Ok(config)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_the_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.sound_banks.len(), 2);
    }

    #[test]
    fn parses_partial_config() {
        let text = r#"
            topology = "minimal"
            waveform = "triangle"
            sound_bank = "marimba"
            retune_time = 0.05

            [parameters]
            master_volume = 0.8
            delay_time = 12.0

            [impulse]
            kind = "file"
            path = "irs/hall.wav"
        "#;
        let config = EngineConfig::from_toml_str(text).unwrap();

        assert_eq!(config.topology, Topology::Minimal);
        assert_eq!(config.waveform, Waveform::Triangle);
        assert_eq!(config.sound_bank, SoundBank::Samples("marimba".into()));
        assert_eq!(config.parameters.master_volume, 0.8);
        // clamped to the delay capacity
        assert_eq!(config.parameters.delay_time, 5.0);
        assert_eq!(config.parameters.reverb_mix, 0.0);
        assert_eq!(
            config.impulse,
            ImpulseSource::File {
                path: PathBuf::from("irs/hall.wav")
            }
        );
    }

    #[test]
    fn custom_banks_replace_builtins() {
        let text = r#"
            sound_bank = "rhodes"

            [[sound_banks]]
            name = "rhodes"
            base_url = "/srv/rhodes/"
            extension = "wav"
        "#;
        let config = EngineConfig::from_toml_str(text).unwrap();
        let bank = config.bank("rhodes").unwrap();
        assert_eq!(bank.octaves, vec![2, 3, 4, 5]);
        assert!(config.bank("piano").is_none());
    }

    #[test]
    fn unknown_bank_is_rejected() {
        let err = EngineConfig::from_toml_str(r#"sound_bank = "harpsichord""#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBank(name) if name == "harpsichord"));
    }

    #[test]
    fn impulse_can_be_disabled() {
        let config = EngineConfig::from_toml_str("[impulse]\nkind = \"none\"").unwrap();
        assert_eq!(config.impulse, ImpulseSource::None);
    }
}
