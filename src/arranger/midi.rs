// Chart MIDI - Assembles the tempo, beat and drum streams into a type 1 file
// Produces the three-track layout rhythm games expect, using the midly crate

use midly::{Format, Header, MetaMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};

use super::encode::OutputEvent;
use crate::groove::tempo::TempoEventKind;
use crate::timeline::Tick;

/// Name of the beat grid track
pub const BEAT_TRACK_NAME: &str = "BEAT";

/// Name of the drum track
pub const DRUM_TRACK_NAME: &str = "PART DRUMS";

/// Text events written after the drum track name
pub const DRUM_TRACK_TEXTS: [&str; 3] = ["[mix 0 drums0]", "[play]", "[music_start]"];

/// Channel for every chart note
pub const CHART_CHANNEL: u8 = 0;

/// Delta-encoded streams for the three chart tracks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartStreams {
    pub tempo: Vec<(Tick, TempoEventKind)>,
    pub beats: Vec<(Tick, OutputEvent)>,
    pub drums: Vec<(Tick, OutputEvent)>,
}

/// Build the chart file
///
/// Track order is fixed: tempo map, `BEAT`, `PART DRUMS`. The file keeps
/// the source resolution so every tick means the same thing on both sides.
pub fn build_chart(resolution: u16, streams: &ChartStreams) -> Smf<'static> {
    let header = Header {
        format: Format::Parallel,
        timing: Timing::Metrical(resolution.into()),
    };

    let tracks = vec![
        create_tempo_track(&streams.tempo),
        create_note_track(BEAT_TRACK_NAME, &[], &streams.beats),
        create_note_track(DRUM_TRACK_NAME, &DRUM_TRACK_TEXTS, &streams.drums),
    ];

    Smf { header, tracks }
}

/// Serialize a chart to standard MIDI file bytes
pub fn write_chart(smf: &Smf) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

/// Tempo map track: only tempo and time signature changes
fn create_tempo_track(events: &[(Tick, TempoEventKind)]) -> Track<'static> {
    let mut track = Track::with_capacity(events.len() + 1);

    for (delta, kind) in events {
        track.push(TrackEvent {
            delta: (*delta).into(),
            kind: TrackEventKind::Meta(kind.to_meta()),
        });
    }

    add_end_of_track(&mut track, 0);
    track
}

/// Named note track with optional leading text events
fn create_note_track(
    name: &'static str,
    texts: &[&'static str],
    events: &[(Tick, OutputEvent)],
) -> Track<'static> {
    let mut track = Track::with_capacity(events.len() + texts.len() + 2);

    add_track_name(&mut track, 0, name);
    for &text in texts {
        add_text(&mut track, 0, text);
    }

    for (delta, event) in events {
        track.push(TrackEvent {
            delta: (*delta).into(),
            kind: event.to_midi(CHART_CHANNEL),
        });
    }

    add_end_of_track(&mut track, 0);
    track
}

/// Add track name to track
fn add_track_name<'a>(track: &mut Track<'a>, delta: u32, name: &'a str) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
}

fn add_text<'a>(track: &mut Track<'a>, delta: u32, text: &'a str) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::Text(text.as_bytes())),
    });
}

/// Add end of track message
fn add_end_of_track(track: &mut Track, delta: u32) {
    track.push(TrackEvent {
        delta: delta.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::MidiMessage;

    fn sample_streams() -> ChartStreams {
        ChartStreams {
            tempo: vec![
                (0, TempoEventKind::Tempo { micros_per_quarter: 500_000 }),
                (
                    0,
                    TempoEventKind::TimeSignature {
                        numerator: 4,
                        denominator_pow: 2,
                        clocks_per_click: 24,
                        thirty_seconds_per_quarter: 8,
                    },
                ),
            ],
            beats: vec![
                (0, OutputEvent::note_on(0, 12, 100)),
                (0, OutputEvent::note_off(0, 12)),
            ],
            drums: vec![
                (480, OutputEvent::note_on(480, 96, 100)),
                (1, OutputEvent::note_off(481, 96)),
            ],
        }
    }

    #[test]
    fn test_track_layout() {
        let smf = build_chart(480, &sample_streams());

        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(480u16.into()));
        assert_eq!(smf.tracks.len(), 3);

        // Tempo: two changes + end of track
        assert_eq!(smf.tracks[0].len(), 3);
        assert!(smf.tracks[0]
            .iter()
            .all(|e| matches!(e.kind, TrackEventKind::Meta(_))));

        // Beat: name + two notes + end of track
        assert_eq!(
            smf.tracks[1][0].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(b"BEAT"))
        );
        assert_eq!(smf.tracks[1].len(), 4);

        // Drums: name + three texts + two notes + end of track
        let drums = &smf.tracks[2];
        assert_eq!(drums.len(), 7);
        assert_eq!(
            drums[0].kind,
            TrackEventKind::Meta(MetaMessage::TrackName(b"PART DRUMS"))
        );
        assert_eq!(
            drums[1].kind,
            TrackEventKind::Meta(MetaMessage::Text(b"[mix 0 drums0]"))
        );
        assert_eq!(drums[3].kind, TrackEventKind::Meta(MetaMessage::Text(b"[music_start]")));
        assert_eq!(drums[4].delta.as_int(), 480);
        assert_eq!(drums[5].delta.as_int(), 1);
        assert_eq!(drums[6].kind, TrackEventKind::Meta(MetaMessage::EndOfTrack));
    }

    #[test]
    fn test_written_chart_parses() {
        let smf = build_chart(960, &sample_streams());
        let bytes = write_chart(&smf).unwrap();

        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.header.timing, Timing::Metrical(960u16.into()));
        assert_eq!(parsed.tracks.len(), 3);

        match parsed.tracks[2][4].kind {
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn { key, vel },
            } => {
                assert_eq!(channel.as_int(), CHART_CHANNEL);
                assert_eq!(key.as_int(), 96);
                assert_eq!(vel.as_int(), 100);
            }
            other => panic!("Expected NoteOn, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_streams_still_have_three_tracks() {
        let smf = build_chart(480, &ChartStreams::default());
        let bytes = write_chart(&smf).unwrap();

        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.tracks.len(), 3);
        assert_eq!(parsed.tracks[0].len(), 1);
    }
}
