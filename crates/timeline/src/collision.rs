//! Overlap detection and nearest-available-space search on a track.
//!
//! Placement conflicts are resolved bidirectionally: the proposal snaps to
//! whichever edge of the colliding item is closer, walking chains of adjacent
//! items in that direction and falling back to the other side when the walk
//! hits the track start. Group moves resolve as a rigid body so relative
//! spacing inside a dragged selection is preserved.

use tracing::debug;

use crate::{Frame, ItemId, Timeline, TrackId};

/// Safety valve against pathological chains of adjacent items.
pub const MAX_RESOLVE_STEPS: usize = 1000;

/// Half-open interval overlap test over `[from, from + duration)`.
pub fn overlaps(a_from: Frame, a_dur: Frame, b_from: Frame, b_dur: Frame) -> bool {
    a_from < b_from + b_dur && b_from < a_from + a_dur
}

/// Obstacle spans on a track, sorted by start frame. Items in `exclude` and
/// items transition-linked to `moving` (their overlap is deliberate) are not
/// obstacles.
fn obstacles(
    timeline: &Timeline,
    track_id: TrackId,
    moving: Option<ItemId>,
    exclude: &[ItemId],
) -> Vec<(Frame, Frame)> {
    let mut spans: Vec<(Frame, Frame)> = timeline
        .items_on_track(track_id)
        .filter(|i| !exclude.contains(&i.id))
        .filter(|i| moving.map_or(true, |m| !timeline.linked(m, i.id)))
        .map(|i| (i.from, i.duration_in_frames))
        .collect();
    spans.sort_by_key(|s| s.0);
    spans
}

fn first_collision(spans: &[(Frame, Frame)], from: Frame, duration: Frame) -> Option<(Frame, Frame)> {
    spans
        .iter()
        .copied()
        .find(|&(s_from, s_dur)| overlaps(from, duration, s_from, s_dur))
}

/// Walk one direction through a chain of blocking items until the placement
/// is free. Backward walks fail once a candidate would start before frame 0.
fn walk(spans: &[(Frame, Frame)], mut candidate: Frame, duration: Frame, forward: bool) -> Option<Frame> {
    for _ in 0..MAX_RESOLVE_STEPS {
        if candidate < 0 {
            return None;
        }
        match first_collision(spans, candidate, duration) {
            None => return Some(candidate),
            Some((hit_from, hit_dur)) => {
                candidate = if forward {
                    hit_from + hit_dur
                } else {
                    hit_from - duration
                };
            }
        }
    }
    None
}

/// Find the free placement nearest to `proposed_from` for a span of
/// `duration` frames. A collision-free proposal is returned unchanged.
/// Returns `None` when no space exists in either direction; the caller must
/// abort the edit rather than clamp.
pub fn find_nearest_available_space(
    timeline: &Timeline,
    track_id: TrackId,
    proposed_from: Frame,
    duration: Frame,
    moving: Option<ItemId>,
    exclude: &[ItemId],
) -> Option<Frame> {
    let spans = obstacles(timeline, track_id, moving, exclude);
    let hit = match first_collision(&spans, proposed_from, duration) {
        None => return Some(proposed_from),
        Some(hit) => hit,
    };

    let back = hit.0 - duration;
    let forward = hit.0 + hit.1;
    let back_first = back >= 0 && (proposed_from - back) < (forward - proposed_from);

    let resolved = if back_first {
        walk(&spans, back, duration, false).or_else(|| walk(&spans, forward, duration, true))
    } else {
        walk(&spans, forward, duration, true).or_else(|| walk(&spans, back, duration, false))
    };
    debug!(
        track = %track_id,
        proposed = proposed_from,
        ?resolved,
        "collision resolution"
    );
    resolved
}

/// One member of a rigidly-moved group at its proposed position.
#[derive(Debug, Clone, Copy)]
pub struct GroupMember {
    pub id: ItemId,
    pub track_id: TrackId,
    pub from: Frame,
    pub duration: Frame,
}

/// Resolve collisions for a whole dragged group as a rigid body: each pass
/// computes the forward shift every member needs independently, then applies
/// the maximum uniformly so relative spacing is preserved. `exclude` is the
/// set of items leaving their old positions (empty for duplication, where the
/// originals stay and remain obstacles). `keep_links` exempts each member's
/// transition partners from its obstacles; duplication passes false, since a
/// copy carries no transition and its partner is a real obstacle.
pub fn resolve_group_shift(
    timeline: &Timeline,
    members: &[GroupMember],
    exclude: &[ItemId],
    keep_links: bool,
) -> Option<Frame> {
    let mut total_shift: Frame = 0;

    for _ in 0..MAX_RESOLVE_STEPS {
        let mut pass_shift: Frame = 0;
        for member in members {
            let moving = keep_links.then_some(member.id);
            let spans = obstacles(timeline, member.track_id, moving, exclude);
            let pos = member.from + total_shift;
            for &(s_from, s_dur) in &spans {
                if overlaps(pos, member.duration, s_from, s_dur) {
                    pass_shift = pass_shift.max(s_from + s_dur - pos);
                }
            }
        }
        if pass_shift == 0 {
            return Some(total_shift);
        }
        total_shift += pass_shift;
    }
    None
}
