// Groove Engine - Tempo map, beat grid, and magnetic quantization

pub mod tempo;
pub mod grid;
pub mod quantize;

pub use tempo::{TempoEvent, TempoEventKind, TempoMap, DEFAULT_TEMPO};
pub use grid::{BeatMarker, generate_beat_grid, beat_events, BEAT_NOTE, DOWNBEAT_NOTE};
pub use quantize::SnapGrid;
