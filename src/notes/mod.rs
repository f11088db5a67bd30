//! Note identities and their equal-tempered frequencies.

mod key;
mod table;

pub use key::{NoteKey, NoteName, MAX_OCTAVE, MIN_OCTAVE};
pub use table::frequency_of;
