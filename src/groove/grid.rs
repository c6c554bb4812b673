// Beat Grid - Downbeat and beat markers spanning the whole song
// Drives the game's bar lines and metronome from the tempo map's time signatures

use serde::{Deserialize, Serialize};

use crate::arranger::encode::OutputEvent;
use crate::timeline::Tick;

/// Marker note for the first beat of a bar
pub const DOWNBEAT_NOTE: u8 = 12;

/// Marker note for every other beat
pub const BEAT_NOTE: u8 = 13;

/// Beats per bar assumed until the first time signature change
pub const DEFAULT_BEATS_PER_BAR: u8 = 4;

/// Velocity written on beat marker note-ons
pub const BEAT_VELOCITY: u8 = 100;

/// One quarter-note beat on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatMarker {
    pub tick: Tick,
    pub is_downbeat: bool,
}

impl BeatMarker {
    pub fn note(&self) -> u8 {
        if self.is_downbeat {
            DOWNBEAT_NOTE
        } else {
            BEAT_NOTE
        }
    }
}

/// Generate one marker per quarter note from tick 0 up to `duration`
///
/// `time_signatures` are `(tick, beats_per_bar)` changes. The walk starts in
/// 4/4 unless a change sits at tick 0, and every change restarts the bar so
/// the next beat is a downbeat.
pub fn generate_beat_grid(
    time_signatures: impl IntoIterator<Item = (Tick, u8)>,
    resolution: u16,
    duration: Tick,
) -> Vec<BeatMarker> {
    if resolution == 0 {
        log::warn!("Zero tick resolution, no beat grid generated");
        return Vec::new();
    }

    let mut signatures = vec![(0, DEFAULT_BEATS_PER_BAR)];
    signatures.extend(time_signatures);
    // Stable: changes sharing a tick keep their authored order
    signatures.sort_by_key(|&(tick, _)| tick);

    let step = Tick::from(resolution);
    let mut markers = Vec::with_capacity((duration / step) as usize + 1);
    let mut idx = 0;
    let mut beats_per_bar = beats_in_bar(signatures[0].1);
    let mut beat_in_bar: u32 = 0;
    let mut current: Tick = 0;

    while current < duration {
        // Consume every change at or before this beat
        while idx + 1 < signatures.len() && current >= signatures[idx + 1].0 {
            idx += 1;
            beats_per_bar = beats_in_bar(signatures[idx].1);
            beat_in_bar = 0;
        }

        markers.push(BeatMarker {
            tick: current,
            is_downbeat: beat_in_bar == 0,
        });

        beat_in_bar = (beat_in_bar + 1) % beats_per_bar;
        current = match current.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    markers
}

/// Expand markers into note-on/note-off pairs on the same tick
pub fn beat_events(markers: &[BeatMarker]) -> Vec<OutputEvent> {
    markers
        .iter()
        .flat_map(|marker| {
            [
                OutputEvent::note_on(marker.tick, marker.note(), BEAT_VELOCITY),
                OutputEvent::note_off(marker.tick, marker.note()),
            ]
        })
        .collect()
}

fn beats_in_bar(numerator: u8) -> u32 {
    if numerator == 0 {
        log::warn!("Time signature with zero beats per bar, treating as 1");
        1
    } else {
        u32::from(numerator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downbeat_ticks(markers: &[BeatMarker]) -> Vec<Tick> {
        markers
            .iter()
            .filter(|m| m.is_downbeat)
            .map(|m| m.tick)
            .collect()
    }

    #[test]
    fn test_default_four_four() {
        let markers = generate_beat_grid(Vec::new(), 480, 480 * 8);

        assert_eq!(markers.len(), 8);
        assert_eq!(downbeat_ticks(&markers), vec![0, 1920]);
        assert_eq!(markers[1].tick, 480);
        assert!(!markers[1].is_downbeat);
    }

    #[test]
    fn test_beat_count_rounds_up() {
        // ceil(1000 / 480) = 3
        let markers = generate_beat_grid(Vec::new(), 480, 1000);
        assert_eq!(markers.len(), 3);

        assert!(generate_beat_grid(Vec::new(), 480, 0).is_empty());
    }

    #[test]
    fn test_signature_at_zero_overrides_default() {
        let markers = generate_beat_grid(vec![(0, 3)], 480, 480 * 6);
        assert_eq!(downbeat_ticks(&markers), vec![0, 1440]);
    }

    #[test]
    fn test_change_resets_bar_phase() {
        // 4/4, then 3/4 starting mid-bar at beat 6
        let markers = generate_beat_grid(vec![(0, 4), (480 * 6, 3)], 480, 480 * 12);
        assert_eq!(downbeat_ticks(&markers), vec![0, 1920, 2880, 4320]);
    }

    #[test]
    fn test_change_between_beats_applies_on_next_beat() {
        let markers = generate_beat_grid(vec![(1000, 2)], 480, 480 * 6);
        // Change at 1000 is picked up at tick 1440
        assert_eq!(downbeat_ticks(&markers), vec![0, 1440, 2400]);
    }

    #[test]
    fn test_several_changes_in_one_step() {
        let markers = generate_beat_grid(vec![(100, 5), (200, 2)], 480, 480 * 5);
        // The later change wins once both have passed
        assert_eq!(downbeat_ticks(&markers), vec![0, 480, 1440]);
    }

    #[test]
    fn test_zero_numerator_and_zero_resolution() {
        let markers = generate_beat_grid(vec![(0, 0)], 480, 480 * 3);
        assert!(markers.iter().all(|m| m.is_downbeat));

        assert!(generate_beat_grid(Vec::new(), 0, 1000).is_empty());
    }

    #[test]
    fn test_beat_events() {
        let markers = generate_beat_grid(Vec::new(), 480, 960);
        let events = beat_events(&markers);

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], OutputEvent::note_on(0, DOWNBEAT_NOTE, 100));
        assert_eq!(events[1], OutputEvent::note_off(0, DOWNBEAT_NOTE));
        assert_eq!(events[2], OutputEvent::note_on(480, BEAT_NOTE, 100));
        assert_eq!(events[3], OutputEvent::note_off(480, BEAT_NOTE));
    }
}
