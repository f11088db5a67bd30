//! Error types shared across the crate.
//!
//! Nothing here is fatal to the instrument: every error degrades a single
//! note or a single effect and is logged by the caller.

use std::path::PathBuf;

use crate::notes::NoteKey;

/// Invalid note identity or pitch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoteError {
    #[error("octave {octave} is outside the supported range {min}..={max}")]
    OctaveOutOfRange { octave: i32, min: i8, max: i8 },

    #[error("unknown note name '{0}'")]
    UnknownName(String),

    #[error("invalid frequency: {0} Hz")]
    InvalidFrequency(f32),
}

/// Rejected voice operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoiceError {
    #[error(transparent)]
    Note(#[from] NoteError),

    #[error("no active voice for {0}")]
    NoVoice(NoteKey),

    #[error("voice for {0} cannot be retuned")]
    NotRetunable(NoteKey),

    #[error("no sample loaded for {key} in bank '{bank}'")]
    SampleUnavailable { bank: String, key: NoteKey },
}

/// Failure to load or decode an external audio asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio file error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("no audio track found in {0}")]
    NoTrack(PathBuf),

    #[error("{0} decoded to zero frames")]
    Empty(PathBuf),

    #[error("unsupported asset location '{0}' (only filesystem paths are loaded)")]
    UnsupportedLocation(String),
}

/// Configuration could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown sound bank '{0}'")]
    UnknownBank(String),
}
