// Conversion pipeline
// Source MIDI -> tempo map, beat grid, humanized and collision-free drum chart

pub mod trace;

pub use trace::{read_trace_file, Stage, TraceEntry, TraceError, TraceWriter};

use midly::{Smf, Timing};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::arranger::drum_lanes::{Lane, LaneMap};
use crate::arranger::encode::{encode_deltas, OutputEvent};
use crate::arranger::midi::{build_chart, write_chart, ChartStreams};
use crate::arranger::resolve::resolve_collisions;
use crate::config::{ConfigError, ConvertConfig};
use crate::groove::grid::{beat_events, generate_beat_grid, BeatMarker};
use crate::groove::tempo::TempoMap;
use crate::timeline::{extract_timeline, humanize, source_duration, Tick, Timeline};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to read MIDI: {0}")]
    Midi(#[from] midly::Error),

    #[error("SMPTE timecode files are not supported, only ticks per quarter note")]
    UnsupportedTiming,

    #[error("Tick resolution must be greater than zero")]
    InvalidResolution,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Counters summarizing one conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub resolution: u16,
    pub duration_ticks: Tick,
    pub tempo_events: usize,
    pub beats: usize,
    pub notes_extracted: usize,
    pub notes_snapped: usize,
    pub ticks_humanized: usize,
    pub notes_dropped: usize,
    pub green_collisions: usize,
    pub blue_collisions: usize,
    pub gems: usize,
    pub tom_markers: usize,
}

/// A finished chart, kept in absolute ticks alongside its encoded streams
#[derive(Debug, Clone)]
pub struct Chart {
    pub resolution: u16,
    pub tempo_map: TempoMap,
    pub beats: Vec<BeatMarker>,
    pub timeline: Timeline,
    pub drum_events: Vec<OutputEvent>,
    pub streams: ChartStreams,
    pub report: ConversionReport,
    pub trace: Vec<TraceEntry>,
}

impl Chart {
    pub fn to_smf(&self) -> Smf<'static> {
        build_chart(self.resolution, &self.streams)
    }

    /// Standard MIDI file bytes for `notes.mid`
    pub fn to_bytes(&self) -> ConvertResult<Vec<u8>> {
        Ok(write_chart(&self.to_smf())?)
    }
}

/// Convert a MIDI file on disk
pub fn convert_file(path: &Path, config: &ConvertConfig, lanes: &LaneMap) -> ConvertResult<Chart> {
    let bytes = std::fs::read(path)?;
    convert_bytes(&bytes, config, lanes)
}

/// Convert raw MIDI file bytes
pub fn convert_bytes(bytes: &[u8], config: &ConvertConfig, lanes: &LaneMap) -> ConvertResult<Chart> {
    let smf = Smf::parse(bytes)?;
    convert(&smf, config, lanes)
}

/// Run every stage over a parsed file
///
/// The source is only read; nothing is produced unless every stage succeeds.
pub fn convert(smf: &Smf, config: &ConvertConfig, lanes: &LaneMap) -> ConvertResult<Chart> {
    config.validate()?;

    let resolution = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(..) => return Err(ConvertError::UnsupportedTiming),
    };
    if resolution == 0 {
        return Err(ConvertError::InvalidResolution);
    }

    let mut trace = Vec::with_capacity(Stage::ALL.len());
    let mut report = ConversionReport {
        resolution,
        duration_ticks: source_duration(&smf.tracks),
        ..Default::default()
    };

    // Tempo map from the conductor track
    let tempo_map = TempoMap::from_track(smf.tracks.first().map(|track| track.as_slice()));
    report.tempo_events = tempo_map.len();
    trace.push(TraceEntry::completed(
        Stage::TempoMap,
        format!("{} tempo events", tempo_map.len()),
        &tempo_map,
    ));

    // Beat grid across the longest track
    let beats = generate_beat_grid(tempo_map.time_signatures(), resolution, report.duration_ticks);
    report.beats = beats.len();
    trace.push(TraceEntry::completed(
        Stage::BeatGrid,
        format!("{} beats over {} ticks", beats.len(), report.duration_ticks),
        &serde_json::json!({
            "beats": beats.len(),
            "downbeats": beats.iter().filter(|b| b.is_downbeat).count(),
        }),
    ));

    // Percussion timeline
    let (mut builder, extract_stats) = extract_timeline(&smf.tracks, resolution, config, lanes);
    report.notes_extracted = extract_stats.extracted;
    report.notes_snapped = extract_stats.snapped;
    trace.push(TraceEntry::completed(
        Stage::Extract,
        format!("{} drum notes on {} ticks", extract_stats.extracted, builder.len()),
        &extract_stats,
    ));

    // Two hands plus the kick foot
    let humanize_stats = humanize(&mut builder, lanes, config.max_hands);
    report.ticks_humanized = humanize_stats.ticks_reduced;
    report.notes_dropped = humanize_stats.notes_dropped;
    trace.push(TraceEntry::completed(
        Stage::Humanize,
        format!("Dropped {} notes", humanize_stats.notes_dropped),
        &humanize_stats,
    ));

    let timeline = builder.freeze();

    let (drum_events, resolve_stats) =
        resolve_collisions(&timeline, lanes, config.note_length, config.note_velocity);
    report.green_collisions = resolve_stats.collisions_for(Lane::Green);
    report.blue_collisions = resolve_stats.collisions_for(Lane::Blue);
    report.gems = resolve_stats.gems;
    report.tom_markers = resolve_stats.tom_markers;
    trace.push(TraceEntry::completed(
        Stage::Resolve,
        format!(
            "{} gems, {} tom markers, {} collisions",
            resolve_stats.gems,
            resolve_stats.tom_markers,
            report.green_collisions + report.blue_collisions
        ),
        &resolve_stats,
    ));

    let streams = ChartStreams {
        tempo: tempo_map.delta_events(),
        beats: encode_deltas(beat_events(&beats).into_iter().map(|e| (e.tick, e))),
        drums: encode_deltas(drum_events.iter().map(|e| (e.tick, *e))),
    };
    trace.push(TraceEntry::completed(
        Stage::Encode,
        "Encoded tempo, beat and drum tracks",
        &serde_json::json!({
            "tempo_events": streams.tempo.len(),
            "beat_events": streams.beats.len(),
            "drum_events": streams.drums.len(),
        }),
    ));

    log::info!(
        "Converted {} ticks at {} PPQ ({:.1} BPM): {} gems, {} dropped, {} beats",
        report.duration_ticks,
        resolution,
        tempo_map.initial_bpm(),
        report.gems,
        report.notes_dropped,
        report.beats
    );

    Ok(Chart {
        resolution,
        tempo_map,
        beats,
        timeline,
        drum_events,
        streams,
        report,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::{Format, Header, MetaMessage, MidiMessage, TrackEvent, TrackEventKind};

    fn note_on(delta: u32, key: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: 9u8.into(),
                message: MidiMessage::NoteOn {
                    key: key.into(),
                    vel: 100u8.into(),
                },
            },
        }
    }

    fn sample_smf(timing: Timing) -> Smf<'static> {
        Smf {
            header: Header {
                format: Format::Parallel,
                timing,
            },
            tracks: vec![
                vec![TrackEvent {
                    delta: 0u32.into(),
                    kind: TrackEventKind::Meta(MetaMessage::Tempo(500_000u32.into())),
                }],
                vec![note_on(0, 36), note_on(0, 49), note_on(0, 41), note_on(960, 38)],
            ],
        }
    }

    #[test]
    fn test_convert_report() {
        let smf = sample_smf(Timing::Metrical(480u16.into()));
        let chart = convert(&smf, &ConvertConfig::default(), &LaneMap::pro_drums()).unwrap();

        assert_eq!(chart.report.resolution, 480);
        assert_eq!(chart.report.duration_ticks, 960);
        assert_eq!(chart.report.tempo_events, 1);
        assert_eq!(chart.report.beats, 2);
        assert_eq!(chart.report.notes_extracted, 4);
        assert_eq!(chart.report.green_collisions, 1);
        assert_eq!(chart.report.gems, 4);
        assert_eq!(chart.report.tom_markers, 1);
        assert_eq!(chart.trace.len(), Stage::ALL.len());
        assert_eq!(chart.streams.drums.len(), chart.drum_events.len());
    }

    #[test]
    fn test_timecode_is_rejected() {
        let smf = sample_smf(Timing::Timecode(midly::Fps::Fps25, 40));
        let result = convert(&smf, &ConvertConfig::default(), &LaneMap::pro_drums());
        assert!(matches!(result, Err(ConvertError::UnsupportedTiming)));
    }

    #[test]
    fn test_zero_resolution_is_rejected() {
        let smf = sample_smf(Timing::Metrical(0u16.into()));
        let result = convert(&smf, &ConvertConfig::default(), &LaneMap::pro_drums());
        assert!(matches!(result, Err(ConvertError::InvalidResolution)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let smf = sample_smf(Timing::Metrical(480u16.into()));
        let config = ConvertConfig {
            max_hands: 0,
            ..Default::default()
        };
        let result = convert(&smf, &config, &LaneMap::pro_drums());
        assert!(matches!(result, Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_garbage_bytes_are_a_midi_error() {
        let result = convert_bytes(b"not a midi file", &ConvertConfig::default(), &LaneMap::pro_drums());
        assert!(matches!(result, Err(ConvertError::Midi(_))));
    }
}
