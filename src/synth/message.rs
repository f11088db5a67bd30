#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::notes::NoteKey;

/// Events for the presentation layer (key highlighting).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Notification {
    NoteOn(NoteKey),
    NoteOff(NoteKey),
    NoteRetuned { from: NoteKey, to: NoteKey },
    Hovered(Option<NoteKey>),
}

/// Source of messages for the audio thread.
pub trait MessageReceiver<T> {
    fn pop(&mut self) -> Option<T>;
}

#[cfg(feature = "rtrb")]
impl<T> MessageReceiver<T> for Consumer<T> {
    fn pop(&mut self) -> Option<T> {
        Consumer::pop(self).ok()
    }
}

impl<T> MessageReceiver<T> for std::collections::VecDeque<T> {
    fn pop(&mut self) -> Option<T> {
        self.pop_front()
    }
}
