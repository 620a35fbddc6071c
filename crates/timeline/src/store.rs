//! The authoritative timeline state and its only mutation surface.
//!
//! Every operation is atomic: the proposed gesture is applied to a scratch
//! copy first, invalid transitions are swept there, and invariants are
//! checked before anything touches the real aggregate. A rejected edit
//! leaves no trace; an accepted one lands as a single undoable step.
//! Transition breakage is demoted to an event returned to the caller:
//! the transition is removed and surfaced, never thrown.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    apply_command, collision, CommandHistory, EditCommand, Frame, ItemId, SourceBounds,
    StretchPreview, Timeline, TimelineError, TimelineItem, Track, TrackId, Transition,
    TransitionId, TrimPreview, MAX_SPEED, MIN_ITEM_DURATION, MIN_SPEED,
};

/// Discrete notifications surfaced to the UI after a commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimelineEvent {
    TransitionBroken {
        transition: TransitionId,
        left: ItemId,
        right: ItemId,
    },
}

/// Result of an accepted commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Commit {
    pub events: Vec<TimelineEvent>,
    /// Items created by this commit (duplicates, split fragments).
    pub created: Vec<ItemId>,
}

/// Target placement for one item in a move or duplicate batch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ItemMove {
    pub item_id: ItemId,
    pub track_id: TrackId,
    pub from: Frame,
}

#[derive(Debug, Default)]
pub struct TimelineStore {
    timeline: Timeline,
    history: CommandHistory,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeline(timeline: Timeline) -> Self {
        Self {
            timeline,
            history: CommandHistory::default(),
        }
    }

    /// Immutable snapshot the engines compute against.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn undo(&mut self) -> Result<(), TimelineError> {
        self.history.undo(&mut self.timeline)
    }

    pub fn redo(&mut self) -> Result<(), TimelineError> {
        self.history.redo(&mut self.timeline)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // Track upkeep

    pub fn upsert_track(&mut self, track: Track) -> Result<(), TimelineError> {
        self.history
            .apply(&mut self.timeline, EditCommand::UpsertTrack { track })
    }

    pub fn remove_track(&mut self, track_id: TrackId) -> Result<(), TimelineError> {
        self.history
            .apply(&mut self.timeline, EditCommand::RemoveTrack { track_id })
    }

    // Item lifecycle

    /// Place a new item (drop operation). The caller builds the item via
    /// `TimelineItem::new`, which assigns id and origin.
    pub fn insert_item(&mut self, item: TimelineItem) -> Result<Commit, TimelineError> {
        let track = self.timeline.track(item.track_id)?;
        if track.locked {
            return Err(TimelineError::TrackLocked(track.id));
        }
        self.commit_batch("insert", vec![EditCommand::InsertItem { item }], Vec::new())
    }

    pub fn delete_item(&mut self, item_id: ItemId) -> Result<Commit, TimelineError> {
        self.ensure_unlocked(item_id)?;
        self.commit_batch(
            "delete",
            vec![EditCommand::RemoveItem { item_id }],
            Vec::new(),
        )
    }

    /// Delete and close the gap: every later item on the track shifts left
    /// by the removed duration, preserving relative spacing.
    pub fn ripple_delete(&mut self, item_id: ItemId) -> Result<Commit, TimelineError> {
        self.ensure_unlocked(item_id)?;
        let removed = self.timeline.item(item_id)?.clone();
        let mut commands = vec![EditCommand::RemoveItem { item_id }];
        let mut later: Vec<TimelineItem> = self
            .timeline
            .items_on_track(removed.track_id)
            .filter(|i| i.id != item_id && i.from >= removed.end())
            .cloned()
            .collect();
        later.sort_by_key(|i| i.from);
        for mut item in later {
            item.from -= removed.duration_in_frames;
            commands.push(EditCommand::UpdateItem { item });
        }
        self.commit_batch("ripple_delete", commands, Vec::new())
    }

    // Moves

    pub fn move_item(
        &mut self,
        item_id: ItemId,
        track_id: TrackId,
        from: Frame,
    ) -> Result<Commit, TimelineError> {
        self.move_items(vec![ItemMove {
            item_id,
            track_id,
            from,
        }])
    }

    /// One atomic multi-item move: either every member lands or none does.
    pub fn move_items(&mut self, moves: Vec<ItemMove>) -> Result<Commit, TimelineError> {
        let mut commands = Vec::with_capacity(moves.len());
        for mv in &moves {
            self.ensure_unlocked(mv.item_id)?;
            let target = self.timeline.track(mv.track_id)?;
            if target.locked {
                return Err(TimelineError::TrackLocked(target.id));
            }
            let mut item = self.timeline.item(mv.item_id)?.clone();
            item.track_id = mv.track_id;
            item.from = mv.from;
            commands.push(EditCommand::UpdateItem { item });
        }
        self.commit_batch("move", commands, Vec::new())
    }

    /// Alt-drag commit: originals stay untouched; copies with fresh ids (and
    /// fresh origins) appear at the destinations.
    pub fn duplicate_items(&mut self, moves: Vec<ItemMove>) -> Result<Commit, TimelineError> {
        let mut commands = Vec::with_capacity(moves.len());
        let mut created = Vec::with_capacity(moves.len());
        for mv in &moves {
            let target = self.timeline.track(mv.track_id)?;
            if target.locked {
                return Err(TimelineError::TrackLocked(target.id));
            }
            let original = self.timeline.item(mv.item_id)?;
            let mut copy = original.clone();
            copy.id = ItemId::new();
            copy.origin_id = crate::OriginId::new();
            copy.track_id = mv.track_id;
            copy.from = mv.from;
            created.push(copy.id);
            commands.push(EditCommand::InsertItem { item: copy });
        }
        self.commit_batch("duplicate", commands, created)
    }

    // Engine commits

    /// Commit a trim preview; a rolling edit's two items land as one step.
    pub fn commit_trim(&mut self, preview: &TrimPreview) -> Result<Commit, TimelineError> {
        self.ensure_unlocked(preview.item.id)?;
        let mut commands = Vec::new();
        for trimmed in std::iter::once(&preview.item).chain(preview.neighbor.iter()) {
            let mut item = self.timeline.item(trimmed.id)?.clone();
            item.from = trimmed.from;
            item.duration_in_frames = trimmed.duration_in_frames;
            item.source = trimmed.source;
            commands.push(EditCommand::UpdateItem { item });
        }
        self.commit_batch("trim", commands, Vec::new())
    }

    pub fn commit_rate_stretch(
        &mut self,
        item_id: ItemId,
        preview: &StretchPreview,
    ) -> Result<Commit, TimelineError> {
        self.ensure_unlocked(item_id)?;
        let mut item = self.timeline.item(item_id)?.clone();
        item.from = preview.from;
        item.duration_in_frames = preview.duration_in_frames;
        item.speed = preview.speed;
        self.commit_batch(
            "rate_stretch",
            vec![EditCommand::UpdateItem { item }],
            Vec::new(),
        )
    }

    // Split / join

    /// Cut an item at a timeline frame strictly inside it. The original
    /// becomes the left fragment (same id, renderer keys survive); the right
    /// fragment is new but shares the origin. The source window is divided
    /// at the speed-adjusted offset.
    pub fn split_item(
        &mut self,
        item_id: ItemId,
        at: Frame,
    ) -> Result<(ItemId, Commit), TimelineError> {
        self.ensure_unlocked(item_id)?;
        let item = self.timeline.item(item_id)?.clone();
        item.check_source()?;
        if at <= item.from || at >= item.end() {
            return Err(TimelineError::InvalidEdit(format!(
                "split point {} outside item {}",
                at, item_id
            )));
        }

        let left_duration = at - item.from;
        let right_duration = item.end() - at;

        let mut left = item.clone();
        left.duration_in_frames = left_duration;

        let mut right = item.clone();
        right.id = ItemId::new();
        right.from = at;
        right.duration_in_frames = right_duration;

        if let Some(src) = item.source {
            // Each fragment must keep >= 1 source frame, so a one-frame
            // window cannot be divided at all.
            if src.window() < 2 {
                return Err(TimelineError::InvalidEdit(format!(
                    "source window of {} too narrow to split",
                    item_id
                )));
            }
            // Shared cut point in source time.
            let cut = (src.start + (left_duration as f64 * item.speed).round() as Frame)
                .clamp(src.start + 1, src.end - 1);
            left.source = Some(SourceBounds { end: cut, ..src });
            right.source = Some(SourceBounds { start: cut, ..src });
        }

        let mut commands = vec![
            EditCommand::UpdateItem { item: left },
            EditCommand::InsertItem { item: right.clone() },
        ];
        // A transition hanging off the original's end now belongs to the
        // right fragment.
        for transition in self.timeline.transitions_for_item(item_id) {
            if transition.left_item == item_id {
                let mut repointed = transition.clone();
                repointed.left_item = right.id;
                commands.push(EditCommand::UpdateTransition {
                    transition: repointed,
                });
            }
        }

        let right_id = right.id;
        let commit = self.commit_batch("split", commands, vec![right_id])?;
        Ok((right_id, commit))
    }

    /// Merge two fragments of the same origin back into one item. Both the
    /// timeline ranges and the source windows must be contiguous.
    pub fn join_items(
        &mut self,
        left_id: ItemId,
        right_id: ItemId,
    ) -> Result<Commit, TimelineError> {
        self.ensure_unlocked(left_id)?;
        let left = self.timeline.item(left_id)?.clone();
        let right = self.timeline.item(right_id)?.clone();

        let joinable = left.origin_id == right.origin_id
            && left.track_id == right.track_id
            && left.speed == right.speed
            && left.media_id == right.media_id
            && right.from == left.end()
            && match (&left.source, &right.source) {
                (Some(l), Some(r)) => l.end == r.start && l.duration == r.duration,
                (None, None) => true,
                _ => false,
            };
        if !joinable {
            return Err(TimelineError::InvalidEdit(format!(
                "items {} and {} are not contiguous fragments",
                left_id, right_id
            )));
        }

        let mut merged = left.clone();
        merged.duration_in_frames += right.duration_in_frames;
        if let (Some(l), Some(r)) = (&left.source, &right.source) {
            merged.source = Some(SourceBounds {
                start: l.start,
                end: r.end,
                duration: l.duration,
            });
        }

        let mut commands = vec![EditCommand::UpdateItem { item: merged }];
        // The right fragment's outgoing transition follows the merged item.
        for transition in self.timeline.transitions_for_item(right_id) {
            if transition.left_item == right_id {
                let mut repointed = transition.clone();
                repointed.left_item = left_id;
                commands.push(EditCommand::UpdateTransition {
                    transition: repointed,
                });
            }
        }
        commands.push(EditCommand::RemoveItem { item_id: right_id });
        self.commit_batch("join", commands, Vec::new())
    }

    // Transitions

    /// Declare a permitted overlap between two adjacent items. Flush clips
    /// are pulled into the overlap: the right clip shifts left by `duration`
    /// so `right.from == left.end() - duration` holds afterwards. A pair
    /// already in that geometry (a reloaded project) is linked as-is.
    pub fn add_transition(
        &mut self,
        left_id: ItemId,
        right_id: ItemId,
        duration: Frame,
    ) -> Result<TransitionId, TimelineError> {
        self.ensure_unlocked(left_id)?;
        let left = self.timeline.item(left_id)?.clone();
        let right = self.timeline.item(right_id)?.clone();
        if duration < 1
            || left.track_id != right.track_id
            || duration > left.duration_in_frames.min(right.duration_in_frames)
        {
            return Err(TimelineError::InvalidEdit(format!(
                "items {} and {} cannot carry a {}-frame transition",
                left_id, right_id, duration
            )));
        }

        let mut commands = Vec::new();
        if right.from == left.end() {
            let mut shifted = right;
            shifted.from = left.end() - duration;
            commands.push(EditCommand::UpdateItem { item: shifted });
        } else if right.from != left.end() - duration {
            return Err(TimelineError::InvalidEdit(format!(
                "items {} and {} are not adjacent",
                left_id, right_id
            )));
        }

        let transition = Transition::new(left_id, right_id, duration);
        let id = transition.id;
        commands.push(EditCommand::AddTransition { transition });
        self.commit_batch("add_transition", commands, Vec::new())?;
        Ok(id)
    }

    pub fn remove_transition(&mut self, transition_id: TransitionId) -> Result<(), TimelineError> {
        self.history.apply(
            &mut self.timeline,
            EditCommand::RemoveTransition { transition_id },
        )
    }

    // Internals

    fn ensure_unlocked(&self, item_id: ItemId) -> Result<(), TimelineError> {
        let item = self.timeline.item(item_id)?;
        let track = self.timeline.track(item.track_id)?;
        if track.locked {
            return Err(TimelineError::TrackLocked(track.id));
        }
        Ok(())
    }

    /// Apply one gesture's commands atomically: rehearse on a scratch copy,
    /// sweep transitions whose adjacency broke, validate, then land the
    /// whole thing (including the sweep) as a single history step.
    fn commit_batch(
        &mut self,
        op: &'static str,
        mut commands: Vec<EditCommand>,
        created: Vec<ItemId>,
    ) -> Result<Commit, TimelineError> {
        let mut scratch = self.timeline.clone();
        apply_command(
            &mut scratch,
            EditCommand::Batch {
                commands: commands.clone(),
            },
        )?;

        let mut events = Vec::new();
        for transition_id in broken_transitions(&scratch) {
            if let Some(t) = scratch.transitions.get(&transition_id) {
                events.push(TimelineEvent::TransitionBroken {
                    transition: transition_id,
                    left: t.left_item,
                    right: t.right_item,
                });
            }
            apply_command(&mut scratch, EditCommand::RemoveTransition { transition_id })?;
            commands.push(EditCommand::RemoveTransition { transition_id });
        }

        validate(&scratch)?;

        self.history
            .apply(&mut self.timeline, EditCommand::Batch { commands })?;

        for event in &events {
            match event {
                TimelineEvent::TransitionBroken {
                    transition,
                    left,
                    right,
                } => warn!(%transition, %left, %right, "transition broken by edit"),
            }
        }
        info!(op, items = self.timeline.items.len(), "commit");
        Ok(Commit { events, created })
    }
}

/// Transitions whose adjacency no longer holds after an edit. A transition
/// breaks when an endpoint is gone, the pair left its shared track, the
/// order inverted, or the left clip's end fell behind
/// `right.from - duration` (the clips separated past the overlap zone).
fn broken_transitions(timeline: &Timeline) -> Vec<TransitionId> {
    let mut broken = Vec::new();
    for (id, t) in &timeline.transitions {
        let ok = match (
            timeline.items.get(&t.left_item),
            timeline.items.get(&t.right_item),
        ) {
            (Some(left), Some(right)) => {
                left.track_id == right.track_id
                    && left.from <= right.from
                    && left.end() >= right.from - t.duration_in_frames
                    && left.end() - right.from <= t.duration_in_frames
            }
            _ => false,
        };
        if !ok {
            broken.push(*id);
        }
    }
    broken.sort_by_key(|id| id.0);
    broken
}

/// Invariant check run against the scratch copy before any commit lands.
fn validate(timeline: &Timeline) -> Result<(), TimelineError> {
    for item in timeline.items.values() {
        if item.from < 0 {
            return Err(TimelineError::InvalidEdit(format!(
                "item {} starts before frame 0",
                item.id
            )));
        }
        if item.duration_in_frames < MIN_ITEM_DURATION {
            return Err(TimelineError::InvalidEdit(format!(
                "item {} shorter than {} frame",
                item.id, MIN_ITEM_DURATION
            )));
        }
        let track = timeline.track(item.track_id)?;
        if track.is_group {
            return Err(TimelineError::InvalidEdit(format!(
                "item {} placed on group track {}",
                item.id, track.id
            )));
        }
        if item.is_media() && !(MIN_SPEED..=MAX_SPEED).contains(&item.speed) {
            return Err(TimelineError::InvalidEdit(format!(
                "item {} speed {} outside [{}, {}]",
                item.id, item.speed, MIN_SPEED, MAX_SPEED
            )));
        }
        if let Some(src) = &item.source {
            if src.start < 0 || src.end <= src.start || src.end > src.duration {
                return Err(TimelineError::InvalidEdit(format!(
                    "item {} source window out of bounds",
                    item.id
                )));
            }
        }
    }

    // Same-track overlap is legal only across a transition, and only up to
    // the transition's width.
    let mut by_track: Vec<&TimelineItem> = timeline.items.values().collect();
    by_track.sort_by_key(|i| (i.track_id.0, i.from));
    let mut reach: Option<&TimelineItem> = None;
    for item in by_track {
        if let Some(prev) = reach {
            if prev.track_id == item.track_id
                && collision::overlaps(
                    prev.from,
                    prev.duration_in_frames,
                    item.from,
                    item.duration_in_frames,
                )
            {
                let allowed = timeline
                    .transition_between(prev.id, item.id)
                    .map(|t| prev.end() - item.from <= t.duration_in_frames)
                    .unwrap_or(false);
                if !allowed {
                    return Err(TimelineError::InvalidEdit(format!(
                        "items {} and {} overlap without a transition",
                        prev.id, item.id
                    )));
                }
            }
        }
        // Compare each item against the furthest-reaching earlier item on
        // its track, so contained items are caught too.
        reach = match reach {
            Some(prev) if prev.track_id == item.track_id && prev.end() > item.end() => Some(prev),
            _ => Some(item),
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemKind;

    fn store_with_track() -> (TimelineStore, TrackId) {
        let mut timeline = Timeline::default();
        let track = Track::new("V1", 0);
        let track_id = track.id;
        timeline.tracks.push(track);
        (TimelineStore::with_timeline(timeline), track_id)
    }

    fn media(track: TrackId, from: Frame, dur: Frame, src_dur: Frame) -> TimelineItem {
        let mut item = TimelineItem::new(track, from, dur, ItemKind::Video);
        item.source = Some(SourceBounds {
            start: 0,
            end: dur.min(src_dur),
            duration: src_dur,
        });
        item
    }

    #[test]
    fn overlapping_move_is_rejected_atomically() {
        let (mut store, track) = store_with_track();
        let a = media(track, 0, 30, 100);
        let b = media(track, 50, 30, 100);
        let (a_id, b_id) = (a.id, b.id);
        store.insert_item(a).unwrap();
        store.insert_item(b).unwrap();

        let before = store.timeline().clone();
        let err = store.move_items(vec![
            ItemMove {
                item_id: a_id,
                track_id: track,
                from: 45,
            },
            ItemMove {
                item_id: b_id,
                track_id: track,
                from: 50,
            },
        ]);
        assert!(err.is_err());
        assert_eq!(store.timeline(), &before);
    }

    #[test]
    fn batch_move_is_one_undo_step() {
        let (mut store, track) = store_with_track();
        let a = media(track, 0, 30, 100);
        let b = media(track, 50, 30, 100);
        let (a_id, b_id) = (a.id, b.id);
        store.insert_item(a).unwrap();
        store.insert_item(b).unwrap();
        let before = store.timeline().clone();

        store
            .move_items(vec![
                ItemMove {
                    item_id: a_id,
                    track_id: track,
                    from: 100,
                },
                ItemMove {
                    item_id: b_id,
                    track_id: track,
                    from: 150,
                },
            ])
            .unwrap();
        assert_eq!(store.timeline().item(a_id).unwrap().from, 100);

        store.undo().unwrap();
        assert_eq!(store.timeline(), &before);
    }

    #[test]
    fn split_then_join_round_trips() {
        let (mut store, track) = store_with_track();
        let item = media(track, 10, 60, 100);
        let id = item.id;
        store.insert_item(item).unwrap();

        let (right_id, commit) = store.split_item(id, 30).unwrap();
        assert_eq!(commit.created, vec![right_id]);
        {
            let left = store.timeline().item(id).unwrap();
            let right = store.timeline().item(right_id).unwrap();
            assert_eq!(left.duration_in_frames, 20);
            assert_eq!(right.from, 30);
            assert_eq!(right.duration_in_frames, 40);
            assert_eq!(left.source.unwrap().end, 20);
            assert_eq!(right.source.unwrap().start, 20);
            assert_eq!(left.origin_id, right.origin_id);
        }

        store.join_items(id, right_id).unwrap();
        let joined = store.timeline().item(id).unwrap();
        assert_eq!(joined.from, 10);
        assert_eq!(joined.duration_in_frames, 60);
        assert_eq!(joined.source.unwrap(), SourceBounds {
            start: 0,
            end: 60,
            duration: 100,
        });
        assert!(store.timeline().items.get(&right_id).is_none());
    }

    #[test]
    fn split_rejects_one_frame_source_window() {
        let (mut store, track) = store_with_track();
        // Half speed: two timeline frames play a single source frame.
        let mut item = media(track, 0, 2, 100);
        item.speed = 0.5;
        item.source = Some(SourceBounds {
            start: 0,
            end: 1,
            duration: 100,
        });
        let id = item.id;
        store.insert_item(item).unwrap();

        assert!(matches!(
            store.split_item(id, 1),
            Err(TimelineError::InvalidEdit(_))
        ));
        // The item is untouched.
        assert_eq!(store.timeline().item(id).unwrap().duration_in_frames, 2);
    }

    #[test]
    fn join_rejects_unrelated_items() {
        let (mut store, track) = store_with_track();
        let a = media(track, 0, 30, 100);
        let b = media(track, 30, 30, 100);
        let (a_id, b_id) = (a.id, b.id);
        store.insert_item(a).unwrap();
        store.insert_item(b).unwrap();
        assert!(matches!(
            store.join_items(a_id, b_id),
            Err(TimelineError::InvalidEdit(_))
        ));
    }

    #[test]
    fn ripple_delete_closes_the_gap() {
        let (mut store, track) = store_with_track();
        let a = media(track, 0, 30, 100);
        let b = media(track, 40, 30, 100);
        let c = media(track, 80, 20, 100);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        store.insert_item(a).unwrap();
        store.insert_item(b).unwrap();
        store.insert_item(c).unwrap();

        store.ripple_delete(b_id).unwrap();
        assert_eq!(store.timeline().item(a_id).unwrap().from, 0);
        assert_eq!(store.timeline().item(c_id).unwrap().from, 50);

        // One gesture, one undo.
        store.undo().unwrap();
        assert_eq!(store.timeline().item(c_id).unwrap().from, 80);
        assert!(store.timeline().items.contains_key(&b_id));
    }

    #[test]
    fn trim_that_separates_linked_clips_emits_one_breakage() {
        let (mut store, track) = store_with_track();
        let a = media(track, 0, 50, 200);
        let b = media(track, 50, 50, 200);
        let (a_id, b_id) = (a.id, b.id);
        store.insert_item(a).unwrap();
        store.insert_item(b).unwrap();
        let transition_id = store.add_transition(a_id, b_id, 10).unwrap();
        assert_eq!(store.timeline().item(b_id).unwrap().from, 40);

        // Shrink A far enough that a.end < b.from - transition.duration.
        let session = crate::TrimSession::begin(
            store.timeline(),
            a_id,
            crate::TrimHandle::End,
            crate::TrimMode::Normal,
        )
        .unwrap();
        let preview = session.preview(store.timeline(), -25, None).unwrap();
        let commit = store.commit_trim(&preview).unwrap();

        assert_eq!(commit.events.len(), 1);
        assert!(matches!(
            commit.events[0],
            TimelineEvent::TransitionBroken { transition, .. } if transition == transition_id
        ));
        assert!(store.timeline().transitions.is_empty());
    }

    #[test]
    fn delete_breaks_attached_transitions_with_events() {
        let (mut store, track) = store_with_track();
        let a = media(track, 0, 50, 200);
        let b = media(track, 50, 50, 200);
        let (a_id, b_id) = (a.id, b.id);
        store.insert_item(a).unwrap();
        store.insert_item(b).unwrap();
        store.add_transition(a_id, b_id, 5).unwrap();

        let commit = store.delete_item(a_id).unwrap();
        assert_eq!(commit.events.len(), 1);
        assert!(store.timeline().transitions.is_empty());
    }

    #[test]
    fn items_never_land_on_group_tracks() {
        let (mut store, _) = store_with_track();
        let mut group = Track::new("Group", 1);
        group.is_group = true;
        let group_id = group.id;
        store.upsert_track(group).unwrap();

        let item = media(group_id, 0, 30, 100);
        assert!(store.insert_item(item).is_err());
    }

    #[test]
    fn locked_track_blocks_mutation() {
        let (mut store, track) = store_with_track();
        let item = media(track, 0, 30, 100);
        let id = item.id;
        store.insert_item(item).unwrap();

        let mut locked = store.timeline().track(track).unwrap().clone();
        locked.locked = true;
        store.upsert_track(locked).unwrap();

        assert!(matches!(
            store.move_item(id, track, 50),
            Err(TimelineError::TrackLocked(_))
        ));
        assert!(matches!(
            store.delete_item(id),
            Err(TimelineError::TrackLocked(_))
        ));
    }
}
