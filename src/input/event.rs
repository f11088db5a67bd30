use crate::notes::NoteKey;

/// Something that can hold a key down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Mouse,
    /// Touch point by id.
    Touch(u64),
    /// Computer key by code.
    Key(u32),
}

/// Raw interaction, already hit-tested.
///
/// `key` is `None` when the position is off the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press {
        source: InputSource,
        key: Option<NoteKey>,
    },
    Move {
        source: InputSource,
        key: Option<NoteKey>,
    },
    Release {
        source: InputSource,
    },
    /// Leave, touch-cancel, lost focus. Treated like a release.
    Cancel {
        source: InputSource,
    },
    SustainDown,
    SustainUp,
}

impl InputEvent {
    pub fn source(&self) -> Option<InputSource> {
        match *self {
            InputEvent::Press { source, .. }
            | InputEvent::Move { source, .. }
            | InputEvent::Release { source }
            | InputEvent::Cancel { source } => Some(source),
            InputEvent::SustainDown | InputEvent::SustainUp => None,
        }
    }
}
