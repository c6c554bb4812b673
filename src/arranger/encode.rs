// Delta Encoding - Absolute-tick event lists to delta-time event lists
// Shared by the tempo, beat and drum tracks

use midly::num::{u4, u7};
use midly::{MidiMessage, TrackEventKind};
use serde::{Deserialize, Serialize};

use crate::timeline::Tick;

/// Note-on or note-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteAction {
    On,
    Off,
}

/// A single note message at an absolute tick, ready for delta encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    pub tick: Tick,
    pub action: NoteAction,
    pub note: u8,
    pub velocity: u8,
}

impl OutputEvent {
    pub fn note_on(tick: Tick, note: u8, velocity: u8) -> Self {
        OutputEvent {
            tick,
            action: NoteAction::On,
            note,
            velocity,
        }
    }

    pub fn note_off(tick: Tick, note: u8) -> Self {
        OutputEvent {
            tick,
            action: NoteAction::Off,
            note,
            velocity: 0,
        }
    }

    pub fn is_note_on(&self) -> bool {
        self.action == NoteAction::On
    }

    /// MIDI message on the given channel
    pub fn to_midi(&self, channel: u8) -> TrackEventKind<'static> {
        let key = u7::from(self.note);
        let message = match self.action {
            NoteAction::On => MidiMessage::NoteOn {
                key,
                vel: u7::from(self.velocity),
            },
            NoteAction::Off => MidiMessage::NoteOff {
                key,
                vel: u7::from(0),
            },
        };

        TrackEventKind::Midi {
            channel: u4::from(channel),
            message,
        }
    }
}

/// Convert `(absolute_tick, event)` pairs into `(delta, event)` pairs
///
/// Input is expected in ascending tick order. An out-of-order event is
/// clamped to a zero delta instead of failing, and the cursor still moves
/// to its tick.
pub fn encode_deltas<T>(events: impl IntoIterator<Item = (Tick, T)>) -> Vec<(Tick, T)> {
    let mut last_tick: Tick = 0;

    events
        .into_iter()
        .map(|(tick, event)| {
            let delta = tick.saturating_sub(last_tick);
            last_tick = tick;
            (delta, event)
        })
        .collect()
}
