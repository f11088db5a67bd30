use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::VoiceError,
    notes::{NoteKey, NoteName},
};

/// Base location of the FatBoy soundfont recordings.
pub const FATBOY_BASE_URL: &str = "https://gleitz.github.io/midi-js-soundfonts/FatBoy/";

/// Decoded mono recording of one note.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub frames: Vec<f32>,
    pub sample_rate: f32,
}

impl SampleBuffer {
    pub fn duration(&self) -> f32 {
        if self.sample_rate <= 0.0 {
            return 0.0;
        }
        self.frames.len() as f32 / self.sample_rate
    }
}

/// Timbre selection: the built-in oscillator or a named sample bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum SoundBank {
    #[default]
    Synth,
    Samples(String),
}

impl SoundBank {
    pub const SYNTH_NAME: &'static str = "synth";

    pub fn name(&self) -> &str {
        match self {
            SoundBank::Synth => Self::SYNTH_NAME,
            SoundBank::Samples(name) => name,
        }
    }
}

impl From<String> for SoundBank {
    fn from(name: String) -> Self {
        if name.eq_ignore_ascii_case(Self::SYNTH_NAME) {
            SoundBank::Synth
        } else {
            SoundBank::Samples(name)
        }
    }
}

impl From<SoundBank> for String {
    fn from(bank: SoundBank) -> Self {
        bank.name().to_string()
    }
}

impl fmt::Display for SoundBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of per-note recordings addressed by a location template:
///
/// `{base_url}{mapped_name}{octave}.{extension}`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleBank {
    pub name: String,
    pub base_url: String,
    pub extension: String,
    /// Note name ("C#") → file stem ("cs"). Missing names fall back to
    /// lowercase with `#` spelled `s`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name_mapping: BTreeMap<String, String>,
    /// Octaves loaded up front.
    #[cfg_attr(feature = "serde", serde(default = "default_octaves"))]
    pub octaves: Vec<i32>,
}

fn default_octaves() -> Vec<i32> {
    vec![2, 3, 4, 5]
}

fn default_mapping() -> BTreeMap<String, String> {
    NoteName::ALL
        .iter()
        .map(|name| (name.as_str().to_string(), fallback_stem(*name)))
        .collect()
}

fn fallback_stem(name: NoteName) -> String {
    name.as_str().to_ascii_lowercase().replace('#', "s")
}

impl SampleBank {
    pub fn new(name: &str, base_url: &str, extension: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            extension: extension.to_string(),
            name_mapping: default_mapping(),
            octaves: default_octaves(),
        }
    }

    /// The banks every configuration starts with.
    pub fn builtin() -> Vec<SampleBank> {
        vec![
            SampleBank::new("piano", FATBOY_BASE_URL, "mp3"),
            SampleBank::new("marimba", FATBOY_BASE_URL, "mp3"),
        ]
    }

    /// Location of the recording for `key`.
    pub fn url_for(&self, key: NoteKey) -> String {
        let name = key.name();
        let stem = self
            .name_mapping
            .get(name.as_str())
            .cloned()
            .unwrap_or_else(|| fallback_stem(name));
        format!("{}{}{}.{}", self.base_url, stem, key.octave(), self.extension)
    }

    /// Every key the bank preloads, in pitch order.
    pub fn preload_keys(&self) -> Vec<NoteKey> {
        let mut keys: Vec<NoteKey> = self
            .octaves
            .iter()
            .flat_map(|&octave| NoteName::ALL.iter().map(move |&name| NoteKey::new(name, octave)))
            .filter_map(Result::ok)
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Decoded recordings by bank and key.
#[derive(Debug, Default)]
pub struct SampleLibrary {
    banks: HashMap<String, HashMap<NoteKey, Arc<SampleBuffer>>>,
}

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bank: &str, key: NoteKey, buffer: Arc<SampleBuffer>) {
        self.banks
            .entry(bank.to_string())
            .or_default()
            .insert(key, buffer);
    }

    /// Recording for `key`, or `SampleUnavailable` (logged) when it never
    /// loaded.
    pub fn get(&self, bank: &str, key: NoteKey) -> Result<Arc<SampleBuffer>, VoiceError> {
        match self.banks.get(bank).and_then(|notes| notes.get(&key)) {
            Some(buffer) => Ok(Arc::clone(buffer)),
            None => {
                warn!(bank, key = %key, "No sample loaded, note stays silent");
                Err(VoiceError::SampleUnavailable {
                    bank: bank.to_string(),
                    key,
                })
            }
        }
    }

    pub fn contains(&self, bank: &str, key: NoteKey) -> bool {
        self.banks
            .get(bank)
            .is_some_and(|notes| notes.contains_key(&key))
    }

    /// Number of recordings loaded for `bank`.
    pub fn loaded(&self, bank: &str) -> usize {
        self.banks.get(bank).map_or(0, HashMap::len)
    }
}
