// Timeline Extraction - Percussion note-ons from every source track
// Filters by channel, velocity and lane vocabulary, then buckets hits by (snapped) tick

use midly::{MidiMessage, Track, TrackEventKind};
use serde::{Deserialize, Serialize};

use super::types::{RawNoteEvent, Tick, TimelineBuilder};
use crate::arranger::drum_lanes::LaneMap;
use crate::config::ConvertConfig;
use crate::groove::quantize::SnapGrid;

/// Counters collected while scanning the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Note-ons seen on the percussion channel
    pub note_ons: usize,

    /// Note-ons dropped for velocity below threshold
    pub below_velocity: usize,

    /// Note-ons dropped for having no lane
    pub unmapped: usize,

    /// Notes kept
    pub extracted: usize,

    /// Kept notes moved by quantization
    pub snapped: usize,
}

/// Collect every percussion note-on that passes the velocity and lane filters
///
/// Tracks are scanned in order and each keeps its own running tick.
pub fn scan_percussion(
    tracks: &[Track],
    config: &ConvertConfig,
    lanes: &LaneMap,
    stats: &mut ExtractStats,
) -> Vec<RawNoteEvent> {
    let mut notes = Vec::new();

    for track in tracks {
        let mut abs_tick: Tick = 0;

        for event in track {
            abs_tick = abs_tick.saturating_add(event.delta.as_int());

            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let MidiMessage::NoteOn { key, vel } = message else {
                continue;
            };
            if channel.as_int() != config.percussion_channel {
                continue;
            }

            stats.note_ons += 1;
            let (note, velocity) = (key.as_int(), vel.as_int());

            if velocity < config.min_velocity {
                stats.below_velocity += 1;
                continue;
            }
            if !lanes.contains(note) {
                stats.unmapped += 1;
                continue;
            }

            notes.push(RawNoteEvent {
                tick: abs_tick,
                note,
                velocity,
                channel: channel.as_int(),
            });
        }
    }

    notes
}

/// Bucket raw notes by tick, snapping each tick first when a grid is given
pub fn bucket_notes(
    notes: &[RawNoteEvent],
    snap: Option<&SnapGrid>,
    stats: &mut ExtractStats,
) -> TimelineBuilder {
    let mut timeline = TimelineBuilder::new();

    for raw in notes {
        let tick = match snap {
            Some(grid) => grid.snap(raw.tick),
            None => raw.tick,
        };
        if tick != raw.tick {
            stats.snapped += 1;
        }

        timeline.insert(tick, raw.note);
        stats.extracted += 1;
    }

    timeline
}

/// Scan all tracks and build the timeline in one pass
pub fn extract_timeline(
    tracks: &[Track],
    resolution: u16,
    config: &ConvertConfig,
    lanes: &LaneMap,
) -> (TimelineBuilder, ExtractStats) {
    let mut stats = ExtractStats::default();
    let notes = scan_percussion(tracks, config, lanes, &mut stats);

    let grid = config
        .quantize
        .then(|| SnapGrid::from_config(resolution, config));
    let timeline = bucket_notes(&notes, grid.as_ref(), &mut stats);

    log::debug!(
        "Extracted {} of {} percussion note-ons ({} quiet, {} unmapped, {} snapped) over {} ticks",
        stats.extracted,
        stats.note_ons,
        stats.below_velocity,
        stats.unmapped,
        stats.snapped,
        timeline.len()
    );

    (timeline, stats)
}

/// Length of the longest track in ticks, end-of-track delta included
pub fn source_duration(tracks: &[Track]) -> Tick {
    tracks
        .iter()
        .map(|track| {
            track
                .iter()
                .fold(0 as Tick, |sum, event| sum.saturating_add(event.delta.as_int()))
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::{MetaMessage, TrackEvent};
    use std::collections::BTreeSet;

    fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: channel.into(),
                message: MidiMessage::NoteOn {
                    key: key.into(),
                    vel: vel.into(),
                },
            },
        }
    }

    fn end_of_track(delta: u32) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        }
    }

    fn raw_config() -> ConvertConfig {
        ConvertConfig {
            quantize: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_filters_channel_velocity_and_vocabulary() {
        let tracks = vec![vec![
            note_on(0, 9, 36, 100),
            note_on(0, 9, 38, 19),  // too quiet
            note_on(0, 9, 38, 20),  // threshold is inclusive
            note_on(0, 0, 42, 100), // not the drum channel
            note_on(0, 9, 56, 100), // cowbell, no lane
            note_on(10, 9, 0, 0),   // silent note-on
        ]];

        let (timeline, stats) =
            extract_timeline(&tracks, 480, &raw_config(), &LaneMap::pro_drums());

        assert_eq!(timeline.notes_at(0), Some(&BTreeSet::from([36, 38])));
        assert_eq!(timeline.len(), 1);
        assert_eq!(stats.note_ons, 5);
        assert_eq!(stats.below_velocity, 2);
        assert_eq!(stats.unmapped, 1);
        assert_eq!(stats.extracted, 2);
    }

    #[test]
    fn test_merges_tracks_on_absolute_ticks() {
        let tracks = vec![
            vec![note_on(480, 9, 36, 100), end_of_track(0)],
            vec![note_on(240, 9, 42, 90), note_on(240, 9, 38, 90)],
        ];

        let (timeline, _) =
            extract_timeline(&tracks, 480, &raw_config(), &LaneMap::pro_drums());

        assert_eq!(timeline.notes_at(240), Some(&BTreeSet::from([42])));
        assert_eq!(timeline.notes_at(480), Some(&BTreeSet::from([36, 38])));
    }

    #[test]
    fn test_quantize_moves_only_near_notes() {
        let tracks = vec![vec![note_on(475, 9, 38, 100), note_on(405, 9, 42, 100)]];
        // Ticks 475 and 880

        let config = ConvertConfig::default();
        let (timeline, stats) = extract_timeline(&tracks, 480, &config, &LaneMap::pro_drums());

        assert_eq!(timeline.notes_at(480), Some(&BTreeSet::from([38])));
        // 880 is 80 ticks from 960 and 160 from 720
        assert_eq!(timeline.notes_at(880), Some(&BTreeSet::from([42])));
        assert_eq!(stats.snapped, 1);
    }

    #[test]
    fn test_quantize_can_merge_ticks() {
        let tracks = vec![vec![note_on(478, 9, 38, 100), note_on(4, 9, 38, 100)]];

        let config = ConvertConfig::default();
        let (timeline, stats) = extract_timeline(&tracks, 480, &config, &LaneMap::pro_drums());

        assert_eq!(timeline.len(), 1);
        assert_eq!(stats.extracted, 2);
        assert_eq!(stats.snapped, 2);
    }

    #[test]
    fn test_source_duration() {
        let tracks = vec![
            vec![note_on(100, 9, 36, 100), end_of_track(50)],
            vec![note_on(400, 9, 36, 100)],
            vec![],
        ];
        assert_eq!(source_duration(&tracks), 400);
        assert_eq!(source_duration(&[]), 0);
    }
}
