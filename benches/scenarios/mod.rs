//! Scenario benchmarks.
//!
//! Chords of held keys rendered through the voice manager alone and through
//! the whole engine with every effect engaged.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
