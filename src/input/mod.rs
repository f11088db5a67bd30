// Purpose: Turn hit-tested interaction events into note operations

pub mod event;
pub mod mapper;

pub use event::{InputEvent, InputSource};
pub use mapper::{InputMapper, NoteControl};
