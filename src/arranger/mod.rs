// Arranger - Lane mapping, collision resolution and chart MIDI output
// Turns the humanized timeline into the note streams the game reads

pub mod drum_lanes;
pub mod resolve;
pub mod encode;
pub mod midi;

// Re-export main types
pub use drum_lanes::{CollisionPair, Lane, LaneMap, Priority};
pub use resolve::{resolve_collisions, ResolveStats};
pub use encode::{encode_deltas, NoteAction, OutputEvent};
pub use midi::{build_chart, write_chart, ChartStreams};
