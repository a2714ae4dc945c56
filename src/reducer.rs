//! Heartbeat/gap bookkeeping for incoming points.
//!
//! The polling feed only serves a short window of recent points, so a gap
//! wider than that window cannot be backfilled from it. Such a gap clears the
//! trackable and asks for a full reload instead.

use crate::trackable::Trackable;
use crate::types::TrackPoint;

/// Size of the heartbeat window served by the polling feed.
pub const DEFAULT_GAP_THRESHOLD: i64 = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub appended: usize,
    pub ignored: usize,
    /// Gap too wide: paths were cleared and the rest of the batch skipped.
    pub reload: bool,
}

impl BatchOutcome {
    /// Points were added and the path is still whole.
    pub fn advanced(&self) -> bool {
        self.appended > 0 && !self.reload
    }
}

/// Apply incremental points in the order given.
pub fn apply_batch(track: &mut Trackable, points: &[TrackPoint], gap_threshold: i64) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for point in points {
        let index = point.index.unwrap_or_else(|| track.next_index());

        let Some(last) = track.last_index() else {
            track.append(index, point.position());
            outcome.appended += 1;
            continue;
        };

        if index <= last {
            outcome.ignored += 1;
            continue;
        }
        // index > last, so only an overflow can leave this empty
        let recoverable = index.checked_sub(last).is_some_and(|gap| gap <= gap_threshold);
        if recoverable {
            track.append(index, point.position());
            outcome.appended += 1;
        } else {
            tracing::info!(id = %track.id(), last, index, "missed points, reloading");
            track.clear_paths();
            outcome.reload = true;
            break;
        }
    }

    outcome
}

/// Replace the trackable's path with a complete history, appended in index
/// order. Unnumbered points follow the point before them; duplicate indices
/// keep the first occurrence.
pub fn apply_history(track: &mut Trackable, points: &[TrackPoint]) -> usize {
    track.reset();

    let mut next = 1i64;
    let mut numbered: Vec<(i64, &TrackPoint)> = points
        .iter()
        .map(|p| {
            let index = p.index.unwrap_or(next);
            next = index.saturating_add(1);
            (index, p)
        })
        .collect();
    numbered.sort_by_key(|&(index, _)| index);

    let mut appended = 0;
    for (index, point) in numbered {
        if track.last_index().is_some_and(|last| index <= last) {
            continue;
        }
        track.append(index, point.position());
        appended += 1;
    }
    appended
}
