// Collision Resolution - Turns the humanized timeline into chart notes
// Moves cymbals off a color a tom already occupies and adds tom animation markers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::drum_lanes::{Lane, LaneMap};
use super::encode::OutputEvent;
use crate::timeline::Timeline;

/// Counters collected while resolving
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveStats {
    /// Ticks with an active collision, keyed by the contested color
    pub collisions: BTreeMap<Lane, usize>,

    /// Playable gems written
    pub gems: usize,

    /// Tom markers written
    pub tom_markers: usize,
}

impl ResolveStats {
    pub fn collisions_for(&self, color: Lane) -> usize {
        self.collisions.get(&color).copied().unwrap_or(0)
    }
}

/// Resolve lane collisions and expand every note into an on/off pair
///
/// Ticks are processed in ascending order and notes within a tick in
/// ascending raw note order. The result is sorted by tick; events on the
/// same tick keep the order they were generated in.
///
/// # Arguments
/// * `timeline` - Humanized timeline
/// * `lanes` - Lane mapping table
/// * `note_length` - Ticks between each note-on and its note-off
/// * `velocity` - Velocity for every note-on
pub fn resolve_collisions(
    timeline: &Timeline,
    lanes: &LaneMap,
    note_length: u32,
    velocity: u8,
) -> (Vec<OutputEvent>, ResolveStats) {
    let mut events = Vec::with_capacity(timeline.note_count() * 2);
    let mut stats = ResolveStats::default();

    for (tick, notes) in timeline.iter() {
        let active: Vec<_> = lanes
            .collisions()
            .iter()
            .filter(|pair| pair.is_active(notes))
            .collect();

        for pair in &active {
            *stats.collisions.entry(pair.color).or_default() += 1;
        }

        let off_tick = tick.saturating_add(note_length);

        for &note in notes {
            let Some(mut lane) = lanes.lane_for(note) else {
                log::debug!("Tick {}: note {} has no lane, skipping", tick, note);
                continue;
            };

            // Cymbals give way; toms keep their color
            if let Some(pair) = active.iter().find(|pair| pair.cymbals.contains(&note)) {
                lane = pair.displaced_to;
            }

            events.push(OutputEvent::note_on(tick, lane.gem(), velocity));
            events.push(OutputEvent::note_off(off_tick, lane.gem()));
            stats.gems += 1;

            if lanes.is_tom(note) {
                if let Some(marker) = lanes.tom_marker(lane) {
                    events.push(OutputEvent::note_on(tick, marker, velocity));
                    events.push(OutputEvent::note_off(off_tick, marker));
                    stats.tom_markers += 1;
                }
            }
        }
    }

    // Stable sort keeps generation order within a tick
    events.sort_by_key(|event| event.tick);

    log::debug!(
        "Resolved {} gems, {} tom markers, {} green / {} blue collisions",
        stats.gems,
        stats.tom_markers,
        stats.collisions_for(Lane::Green),
        stats.collisions_for(Lane::Blue)
    );

    (events, stats)
}
