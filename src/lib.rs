pub mod config;
pub mod dsp;
pub mod engine; // Engine object and the fixed effects graph
pub mod error;
pub mod graph; // Per-voice graph nodes
pub mod input; // Pointer/key events to note calls
pub mod io;
pub mod notes;
pub mod synth; // Voice management

pub use config::{EngineConfig, Topology};
pub use engine::{Control, Engine};
pub use notes::{NoteKey, NoteName};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
