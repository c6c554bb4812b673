// Tempo Map - Tempo and time signature changes from the conductor track
// Flattens the primary track to absolute ticks and re-emits it as deltas

use midly::{MetaMessage, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};

use crate::arranger::encode::encode_deltas;
use crate::timeline::Tick;

/// Microseconds per quarter note at 120 BPM
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Payload of a tempo map entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TempoEventKind {
    Tempo {
        micros_per_quarter: u32,
    },
    TimeSignature {
        numerator: u8,
        /// Denominator as a power of two (2 = quarter note)
        denominator_pow: u8,
        clocks_per_click: u8,
        thirty_seconds_per_quarter: u8,
    },
}

impl TempoEventKind {
    /// Pick tempo and time signature changes out of a meta message
    pub fn from_meta(meta: &MetaMessage) -> Option<Self> {
        match *meta {
            MetaMessage::Tempo(tempo) => Some(TempoEventKind::Tempo {
                micros_per_quarter: tempo.as_int(),
            }),
            MetaMessage::TimeSignature(numerator, denominator_pow, clocks_per_click, thirty_seconds) => {
                Some(TempoEventKind::TimeSignature {
                    numerator,
                    denominator_pow,
                    clocks_per_click,
                    thirty_seconds_per_quarter: thirty_seconds,
                })
            }
            _ => None,
        }
    }

    pub fn to_meta(&self) -> MetaMessage<'static> {
        match *self {
            TempoEventKind::Tempo { micros_per_quarter } => {
                MetaMessage::Tempo(micros_per_quarter.into())
            }
            TempoEventKind::TimeSignature {
                numerator,
                denominator_pow,
                clocks_per_click,
                thirty_seconds_per_quarter,
            } => MetaMessage::TimeSignature(
                numerator,
                denominator_pow,
                clocks_per_click,
                thirty_seconds_per_quarter,
            ),
        }
    }
}

/// A tempo map entry at an absolute tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoEvent {
    pub tick: Tick,
    pub kind: TempoEventKind,
}

/// Ordered tempo and time signature changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempoMap {
    events: Vec<TempoEvent>,
}

impl TempoMap {
    /// Build the map from the primary track
    ///
    /// Events keep their source order, so several changes on one tick stay in
    /// the order they were authored. A missing or empty track gives an empty
    /// map.
    pub fn from_track(track: Option<&[TrackEvent]>) -> Self {
        let Some(track) = track.filter(|t| !t.is_empty()) else {
            log::warn!("Primary track missing or empty, using default tempo and 4/4");
            return TempoMap::default();
        };

        let mut events = Vec::new();
        let mut abs_tick: Tick = 0;

        for event in track {
            abs_tick = abs_tick.saturating_add(event.delta.as_int());
            if let TrackEventKind::Meta(meta) = &event.kind {
                if let Some(kind) = TempoEventKind::from_meta(meta) {
                    events.push(TempoEvent { tick: abs_tick, kind });
                }
            }
        }

        log::debug!("Tempo map: {} events", events.len());
        TempoMap { events }
    }

    pub fn from_events(events: Vec<TempoEvent>) -> Self {
        TempoMap { events }
    }

    pub fn events(&self) -> &[TempoEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time signature changes as `(tick, beats_per_bar)` in map order
    pub fn time_signatures(&self) -> impl Iterator<Item = (Tick, u8)> + '_ {
        self.events.iter().filter_map(|event| match event.kind {
            TempoEventKind::TimeSignature { numerator, .. } => Some((event.tick, numerator)),
            _ => None,
        })
    }

    /// Tempo in effect at the start of the song
    pub fn initial_bpm(&self) -> f64 {
        let micros = self
            .events
            .iter()
            .take_while(|event| event.tick == 0)
            .filter_map(|event| match event.kind {
                TempoEventKind::Tempo { micros_per_quarter } => Some(micros_per_quarter),
                _ => None,
            })
            .last()
            .unwrap_or(DEFAULT_TEMPO);

        60_000_000.0 / micros.max(1) as f64
    }

    /// Re-encode the map as `(delta, kind)` pairs
    pub fn delta_events(&self) -> Vec<(Tick, TempoEventKind)> {
        encode_deltas(self.events.iter().map(|event| (event.tick, event.kind)))
    }
}
