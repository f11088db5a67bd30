//! Input mapper - pointer, touch and key events to note operations
//!
//! Tracks which source is holding which key and whether the sustain
//! modifier is down. It never touches audio; every sound change goes through
//! a [`NoteControl`].

use tracing::debug;

use crate::{
    error::VoiceError,
    input::event::{InputEvent, InputSource},
    notes::NoteKey,
};

/// Note operations the mapper drives.
pub trait NoteControl {
    fn start_note(&mut self, key: NoteKey) -> Result<(), VoiceError>;

    fn stop_note(&mut self, key: NoteKey);

    /// Move a sounding note to another key. `NotRetunable` and `NoVoice`
    /// make the mapper fall back to stop + start.
    fn retune_note(&mut self, from: NoteKey, to: NoteKey) -> Result<(), VoiceError>;

    fn all_stop(&mut self);

    /// Presentation-only highlight.
    fn hover(&mut self, key: Option<NoteKey>);
}

#[derive(Debug)]
pub struct InputMapper {
    /// Keys currently held, one per source
    held: Vec<(InputSource, NoteKey)>,
    /// Sustain modifier state
    sustain: bool,
    /// Last reported hover target
    hovered: Option<NoteKey>,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMapper {
    pub fn new() -> Self {
        Self {
            held: Vec::with_capacity(16),
            sustain: false,
            hovered: None,
        }
    }

    pub fn is_sustained(&self) -> bool {
        self.sustain
    }

    pub fn hovered(&self) -> Option<NoteKey> {
        self.hovered
    }

    /// Key held by `source`, if any.
    pub fn held_by(&self, source: InputSource) -> Option<NoteKey> {
        self.held
            .iter()
            .find(|(s, _)| *s == source)
            .map(|&(_, key)| key)
    }

    pub fn held_keys(&self) -> impl Iterator<Item = NoteKey> + '_ {
        self.held.iter().map(|&(_, key)| key)
    }

    pub fn handle(&mut self, event: InputEvent, control: &mut impl NoteControl) {
        match event {
            InputEvent::Press { source, key } => self.press(source, key, control),
            InputEvent::Move { source, key } => self.moved(source, key, control),
            InputEvent::Release { source } | InputEvent::Cancel { source } => {
                self.release(source, control)
            }
            InputEvent::SustainDown => {
                self.sustain = true;
            }
            InputEvent::SustainUp => {
                self.sustain = false;
                // Every held source loses its note along with the sustained ones.
                self.held.clear();
                control.all_stop();
            }
        }
    }

    fn press(&mut self, source: InputSource, key: Option<NoteKey>, control: &mut impl NoteControl) {
        self.release(source, control);

        let Some(key) = key else {
            return;
        };
        if control.start_note(key).is_ok() {
            self.held.push((source, key));
        }
    }

    fn moved(&mut self, source: InputSource, key: Option<NoteKey>, control: &mut impl NoteControl) {
        let Some(index) = self.held.iter().position(|(s, _)| *s == source) else {
            if key != self.hovered {
                self.hovered = key;
                control.hover(key);
            }
            return;
        };

        // Off the keyboard: the current note keeps sounding.
        let Some(to) = key else {
            return;
        };
        let from = self.held[index].1;
        if from == to {
            return;
        }

        let shared = self.is_held_elsewhere(source, from);
        let moved = if shared {
            control.start_note(to).is_ok()
        } else {
            match control.retune_note(from, to) {
                Ok(()) => true,
                Err(VoiceError::NotRetunable(_) | VoiceError::NoVoice(_)) => {
                    control.stop_note(from);
                    control.start_note(to).is_ok()
                }
                Err(e) => {
                    debug!(from = %from, to = %to, error = %e, "Retune failed");
                    false
                }
            }
        };

        if moved {
            self.held[index].1 = to;
        } else {
            self.held.swap_remove(index);
        }
    }

    fn release(&mut self, source: InputSource, control: &mut impl NoteControl) {
        let Some(index) = self.held.iter().position(|(s, _)| *s == source) else {
            return;
        };
        let (_, key) = self.held.swap_remove(index);

        if self.sustain || self.is_held_elsewhere(source, key) {
            return;
        }
        control.stop_note(key);
    }

    fn is_held_elsewhere(&self, source: InputSource, key: NoteKey) -> bool {
        self.held.iter().any(|&(s, k)| s != source && k == key)
    }
}
