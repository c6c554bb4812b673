// Timeline - Percussion hits bucketed by absolute tick
// Built by extraction, reduced by humanization, then frozen for collision resolution

pub mod types;
pub mod extract;
pub mod humanize;

pub use types::{RawNoteEvent, Tick, Timeline, TimelineBuilder};
pub use extract::{extract_timeline, source_duration, ExtractStats};
pub use humanize::{humanize, HumanizeStats};
