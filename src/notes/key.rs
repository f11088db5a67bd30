use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::NoteError;

use super::table::frequency_of;

/// Lowest octave on the keyboard.
pub const MIN_OCTAVE: i8 = 0;
/// Highest octave on the keyboard.
pub const MAX_OCTAVE: i8 = 8;

/// The twelve chromatic pitch classes, spelled with sharps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoteName {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl NoteName {
    /// All note names in chromatic order starting at C.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::Cs,
        NoteName::D,
        NoteName::Ds,
        NoteName::E,
        NoteName::F,
        NoteName::Fs,
        NoteName::G,
        NoteName::Gs,
        NoteName::A,
        NoteName::As,
        NoteName::B,
    ];

    /// Semitones above C (0-11).
    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(semitone: u8) -> Self {
        Self::ALL[(semitone % 12) as usize]
    }

    /// Black keys on a piano.
    pub fn is_sharp(self) -> bool {
        matches!(
            self,
            NoteName::Cs | NoteName::Ds | NoteName::Fs | NoteName::Gs | NoteName::As
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::Cs => "C#",
            NoteName::D => "D",
            NoteName::Ds => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::Fs => "F#",
            NoteName::G => "G",
            NoteName::Gs => "G#",
            NoteName::A => "A",
            NoteName::As => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteName {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let letter = chars.next().map(|c| c.to_ascii_uppercase());
        let natural = match letter {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(NoteError::UnknownName(s.to_string())),
        };

        let semitone = match chars.as_str() {
            "" => natural,
            "#" | "s" => natural + 1,
            "b" => natural + 11,
            _ => return Err(NoteError::UnknownName(s.to_string())),
        };

        Ok(Self::from_semitone(semitone))
    }
}

/// Identity of one playable pitch: note name plus octave.
///
/// The octave is validated on construction, so every `NoteKey` has a table
/// frequency. Used as the unique key of the active-voice map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteKey {
    // Octave first so ordering is by pitch.
    octave: i8,
    name: NoteName,
}

impl NoteKey {
    pub fn new(name: NoteName, octave: i32) -> Result<Self, NoteError> {
        // Validates the range.
        frequency_of(name, octave)?;
        Ok(Self {
            name,
            octave: octave as i8,
        })
    }

    pub fn name(&self) -> NoteName {
        self.name
    }

    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Fundamental frequency in Hz.
    pub fn frequency(&self) -> f32 {
        frequency_of(self.name, self.octave as i32).unwrap_or(0.0)
    }

    /// Semitone distance from C0.
    pub fn index(&self) -> i32 {
        self.octave as i32 * 12 + self.name.semitone() as i32
    }

    /// Key `semitones` away, if it is still on the keyboard.
    pub fn transpose(&self, semitones: i32) -> Option<NoteKey> {
        let index = self.index() + semitones;
        if index < 0 {
            return None;
        }
        let name = NoteName::from_semitone((index % 12) as u8);
        NoteKey::new(name, index / 12).ok()
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

impl FromStr for NoteKey {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(|| NoteError::UnknownName(s.to_string()))?;
        let (name, octave) = s.split_at(split);
        let octave: i32 = octave
            .parse()
            .map_err(|_| NoteError::UnknownName(s.to_string()))?;

        // Flats below C wrap into the previous octave (Cb4 == B3).
        let name_value: NoteName = name.parse()?;
        let octave = if name.len() > 1 && name.ends_with('b') && name_value == NoteName::B {
            octave - 1
        } else {
            octave
        };

        NoteKey::new(name_value, octave)
    }
}

#[cfg(feature = "serde")]
impl Serialize for NoteKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for NoteKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_iff_name_and_octave_match() {
        let a = NoteKey::new(NoteName::C, 4).unwrap();
        let b = NoteKey::new(NoteName::C, 4).unwrap();
        let c = NoteKey::new(NoteName::C, 5).unwrap();
        let d = NoteKey::new(NoteName::Cs, 4).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn rejects_out_of_range_octave() {
        assert!(NoteKey::new(NoteName::A, 9).is_err());
        assert!(NoteKey::new(NoteName::A, -1).is_err());
    }

    #[test]
    fn parses_and_displays() {
        let key: NoteKey = "C#4".parse().unwrap();
        assert_eq!(key.name(), NoteName::Cs);
        assert_eq!(key.octave(), 4);
        assert_eq!(key.to_string(), "C#4");

        let flat: NoteKey = "Db4".parse().unwrap();
        assert_eq!(flat, key);

        let wrapped: NoteKey = "Cb4".parse().unwrap();
        assert_eq!(wrapped.to_string(), "B3");
    }

    #[test]
    fn rejects_garbage() {
        assert!("H4".parse::<NoteKey>().is_err());
        assert!("C".parse::<NoteKey>().is_err());
        assert!("C#x".parse::<NoteKey>().is_err());
        assert!("C12".parse::<NoteKey>().is_err());
    }

    #[test]
    fn transpose_crosses_octaves() {
        let b3: NoteKey = "B3".parse().unwrap();
        assert_eq!(b3.transpose(1).unwrap().to_string(), "C4");
        assert_eq!(b3.transpose(-12).unwrap().to_string(), "B2");

        let c0: NoteKey = "C0".parse().unwrap();
        assert!(c0.transpose(-1).is_none());
    }

    #[test]
    fn ordering_follows_pitch() {
        let b3: NoteKey = "B3".parse().unwrap();
        let c4: NoteKey = "C4".parse().unwrap();
        assert!(b3 < c4);
    }
}
