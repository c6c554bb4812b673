// Timeline types - Raw percussion hits and the per-tick note sets built from them

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Absolute position in ticks at the source file's resolution
pub type Tick = u32;

/// A percussion note-on found in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNoteEvent {
    /// Absolute tick before quantization
    pub tick: Tick,

    /// General MIDI percussion note number
    pub note: u8,

    /// MIDI velocity (1-127)
    pub velocity: u8,

    /// Zero-based MIDI channel
    pub channel: u8,
}

/// Mutable tick -> note set map, owned by extraction and humanization
///
/// Duplicate notes on a tick collapse into one. Call [`TimelineBuilder::freeze`]
/// once the note sets are final.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineBuilder {
    ticks: BTreeMap<Tick, BTreeSet<u8>>,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        TimelineBuilder::default()
    }

    /// Record `note` at `tick`, returning false if it was already there
    pub fn insert(&mut self, tick: Tick, note: u8) -> bool {
        self.ticks.entry(tick).or_default().insert(note)
    }

    pub fn notes_at(&self, tick: Tick) -> Option<&BTreeSet<u8>> {
        self.ticks.get(&tick)
    }

    /// Note sets for in-place reduction, in ascending tick order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Tick, &mut BTreeSet<u8>)> {
        self.ticks.iter_mut().map(|(tick, notes)| (*tick, notes))
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Finish editing and hand the timeline to read-only consumers
    pub fn freeze(self) -> Timeline {
        Timeline { ticks: self.ticks }
    }
}

impl FromIterator<(Tick, u8)> for TimelineBuilder {
    fn from_iter<I: IntoIterator<Item = (Tick, u8)>>(iter: I) -> Self {
        let mut builder = TimelineBuilder::new();
        for (tick, note) in iter {
            builder.insert(tick, note);
        }
        builder
    }
}

/// Frozen tick -> note set map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    ticks: BTreeMap<Tick, BTreeSet<u8>>,
}

impl Timeline {
    /// Note sets in ascending tick order
    pub fn iter(&self) -> impl Iterator<Item = (Tick, &BTreeSet<u8>)> {
        self.ticks.iter().map(|(tick, notes)| (*tick, notes))
    }

    pub fn notes_at(&self, tick: Tick) -> Option<&BTreeSet<u8>> {
        self.ticks.get(&tick)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Total notes across all ticks
    pub fn note_count(&self) -> usize {
        self.ticks.values().map(BTreeSet::len).sum()
    }
}
