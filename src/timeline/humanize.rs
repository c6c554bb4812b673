// Humanization - Limits each tick to what two hands and the kick foot can play
// Drops the lowest-priority hand notes; kicks are never dropped or counted

use serde::{Deserialize, Serialize};

use super::types::TimelineBuilder;
use crate::arranger::drum_lanes::LaneMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanizeStats {
    /// Ticks that lost at least one note
    pub ticks_reduced: usize,

    /// Notes removed in total
    pub notes_dropped: usize,
}

/// Reduce every tick to at most `max_hands` non-kick notes
///
/// Hand notes are ranked by priority tier, highest first, and ties go to
/// the lower note number so the result never depends on arrival order.
/// Ticks with no more than `max_hands` notes in total are left untouched.
pub fn humanize(
    timeline: &mut TimelineBuilder,
    lanes: &LaneMap,
    max_hands: usize,
) -> HumanizeStats {
    let mut stats = HumanizeStats::default();

    for (tick, notes) in timeline.iter_mut() {
        if notes.len() <= max_hands {
            continue;
        }

        let mut hands: Vec<u8> = notes
            .iter()
            .copied()
            .filter(|&note| !lanes.is_kick(note))
            .collect();
        if hands.len() <= max_hands {
            continue;
        }

        hands.sort_by(|&a, &b| {
            lanes
                .priority(b)
                .cmp(&lanes.priority(a))
                .then(a.cmp(&b))
        });

        for dropped in &hands[max_hands..] {
            notes.remove(dropped);
            stats.notes_dropped += 1;
        }
        stats.ticks_reduced += 1;

        log::trace!("Tick {}: kept {:?}", tick, notes);
    }

    if stats.notes_dropped > 0 {
        log::debug!(
            "Humanized {} ticks, dropped {} notes",
            stats.ticks_reduced,
            stats.notes_dropped
        );
    }

    stats
}
