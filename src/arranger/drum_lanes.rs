// Drum Lanes - Maps General MIDI percussion notes to pro-drums chart lanes
// Static lane vocabulary, collision groups, humanization priorities and tom markers

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Base note for the expert difficulty gems
pub const BASE_EXPERT: u8 = 96;

/// General MIDI kick notes (acoustic and electric bass drum)
pub const MIDI_KICKS: [u8; 2] = [35, 36];

/// Playable lane in a five-lane pro-drums chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Kick,
    Snare,
    Yellow,
    Blue,
    Green,
}

impl Lane {
    /// Offset from the difficulty base note, left to right
    pub fn offset(&self) -> u8 {
        match self {
            Lane::Kick => 0,
            Lane::Snare => 1,
            Lane::Yellow => 2,
            Lane::Blue => 3,
            Lane::Green => 4,
        }
    }

    /// Output note number for the expert difficulty
    pub fn gem(&self) -> u8 {
        BASE_EXPERT + self.offset()
    }

    /// Whether this lane is one of the three tom/cymbal colors
    pub fn is_color(&self) -> bool {
        matches!(self, Lane::Yellow | Lane::Blue | Lane::Green)
    }
}

/// Humanization priority tier (higher survives)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Hi-hats
    Low = 1,
    /// Toms and rides
    Mid = 2,
    /// Snares and crashes
    High = 3,
}

/// A cymbal group and a tom group that share a color
///
/// When both groups sound on the same tick the cymbals are moved to
/// `displaced_to`; toms never move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionPair {
    pub color: Lane,
    pub cymbals: BTreeSet<u8>,
    pub toms: BTreeSet<u8>,
    pub displaced_to: Lane,
}

impl CollisionPair {
    /// True when `notes` contains at least one cymbal and one tom of this color
    pub fn is_active(&self, notes: &BTreeSet<u8>) -> bool {
        !notes.is_disjoint(&self.cymbals) && !notes.is_disjoint(&self.toms)
    }
}

/// Immutable lane mapping table shared by every conversion stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneMap {
    mapping: BTreeMap<u8, Lane>,
    kicks: BTreeSet<u8>,
    toms: BTreeSet<u8>,
    priorities: BTreeMap<u8, Priority>,
    tom_markers: BTreeMap<Lane, u8>,
    collisions: Vec<CollisionPair>,
}

impl LaneMap {
    /// The General MIDI to pro-drums table
    pub fn pro_drums() -> Self {
        let mut mapping = BTreeMap::new();
        let mut assign = |notes: &[u8], lane: Lane| {
            for &note in notes {
                mapping.insert(note, lane);
            }
        };

        assign(&MIDI_KICKS, Lane::Kick);
        assign(&[37, 38, 40], Lane::Snare);

        // Toms
        assign(&[48, 50], Lane::Yellow);
        assign(&[45, 47], Lane::Blue);
        assign(&[41, 43], Lane::Green);

        // Hi-hat family and splash
        assign(&[42, 44, 46, 55], Lane::Yellow);
        // Ride, ride bell, crash 2, ride 2
        assign(&[51, 53, 57, 59], Lane::Blue);
        // Crash 1, china
        assign(&[49, 52], Lane::Green);

        let mut priorities = BTreeMap::new();
        for note in [38, 40, 49, 57] {
            priorities.insert(note, Priority::High);
        }
        for note in [51, 59, 41, 43, 45, 47, 48, 50] {
            priorities.insert(note, Priority::Mid);
        }
        for note in [42, 44, 46] {
            priorities.insert(note, Priority::Low);
        }

        let tom_markers = BTreeMap::from([
            (Lane::Yellow, 110),
            (Lane::Blue, 111),
            (Lane::Green, 112),
        ]);

        let collisions = vec![
            CollisionPair {
                color: Lane::Green,
                cymbals: BTreeSet::from([49, 52]),
                toms: BTreeSet::from([41, 43]),
                displaced_to: Lane::Blue,
            },
            CollisionPair {
                color: Lane::Blue,
                cymbals: BTreeSet::from([51, 53, 57, 59]),
                toms: BTreeSet::from([45, 47]),
                displaced_to: Lane::Green,
            },
        ];

        LaneMap {
            mapping,
            kicks: MIDI_KICKS.into_iter().collect(),
            toms: BTreeSet::from([41, 43, 45, 47, 48, 50]),
            priorities,
            tom_markers,
            collisions,
        }
    }

    /// Lane for a raw note, if the note is part of the vocabulary
    pub fn lane_for(&self, note: u8) -> Option<Lane> {
        self.mapping.get(&note).copied()
    }

    pub fn contains(&self, note: u8) -> bool {
        self.mapping.contains_key(&note)
    }

    /// Kicks are played with the feet and are exempt from the hand cap
    pub fn is_kick(&self, note: u8) -> bool {
        self.kicks.contains(&note)
    }

    pub fn is_tom(&self, note: u8) -> bool {
        self.toms.contains(&note)
    }

    /// Humanization priority, defaulting to the middle tier
    pub fn priority(&self, note: u8) -> Priority {
        self.priorities.get(&note).copied().unwrap_or(Priority::Mid)
    }

    /// Animation marker note for a tom hit on `lane`
    pub fn tom_marker(&self, lane: Lane) -> Option<u8> {
        self.tom_markers.get(&lane).copied()
    }

    pub fn collisions(&self) -> &[CollisionPair] {
        &self.collisions
    }

    /// Every mapped raw note, ascending
    pub fn notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.mapping.keys().copied()
    }
}

impl Default for LaneMap {
    fn default() -> Self {
        LaneMap::pro_drums()
    }
}
