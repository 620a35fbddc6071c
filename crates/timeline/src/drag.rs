//! Pointer-driven repositioning of an anchor item plus a following
//! selection.
//!
//! A session moves nothing by itself. `update` turns raw pixel deltas into a
//! clamped, snapped preview the caller can render; `commit` resolves the
//! whole group against the track contents as a rigid body and hands one
//! atomic batch to the store. Dropping the session cancels the gesture.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    collision::{self, GroupMember},
    snap::{self, SnapKind, SnapOptions},
    store::{Commit, ItemMove, TimelineStore},
    Frame, ItemId, Timeline, TimelineError, TrackId, Viewport,
};

/// Pointer travel before a press becomes a drag; shorter movements are
/// treated as a click and commit nothing.
pub const DRAG_THRESHOLD_PX: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    PendingThreshold,
    Dragging,
}

/// What the in-flight group looks like right now, relative to where every
/// member started. Followers share the anchor's offsets so relative spacing
/// is preserved while the pointer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragPreview {
    pub frame_offset: Frame,
    /// Offset in editable-track rows (group tracks are not rows).
    pub track_offset: i64,
    pub snap: Option<SnapKind>,
}

#[derive(Debug, Clone, Copy)]
struct Origin {
    track_id: TrackId,
    from: Frame,
    duration: Frame,
}

#[derive(Debug)]
pub struct DragSession {
    anchor: ItemId,
    members: Vec<ItemId>,
    duplicate: bool,
    state: DragState,
    origins: HashMap<ItemId, Origin>,
    last: Option<DragPreview>,
}

impl DragSession {
    /// Start a gesture on `anchor`. If the current selection contains the
    /// anchor the whole selection follows; otherwise only the anchor moves.
    /// With `duplicate` set (alt-drag), originals stay in place and copies
    /// land on commit.
    pub fn begin(
        timeline: &Timeline,
        anchor: ItemId,
        selection: &[ItemId],
        duplicate: bool,
    ) -> Result<Self, TimelineError> {
        let members: Vec<ItemId> = if selection.contains(&anchor) {
            selection.to_vec()
        } else {
            vec![anchor]
        };

        let mut origins = HashMap::with_capacity(members.len());
        for &id in &members {
            let item = timeline.item(id)?;
            let track = timeline.track(item.track_id)?;
            if !duplicate && track.locked {
                return Err(TimelineError::TrackLocked(track.id));
            }
            origins.insert(
                id,
                Origin {
                    track_id: item.track_id,
                    from: item.from,
                    duration: item.duration_in_frames,
                },
            );
        }

        Ok(Self {
            anchor,
            members,
            duplicate,
            state: DragState::PendingThreshold,
            origins,
            last: None,
        })
    }

    /// Feed a pointer position. Returns `None` while total travel is below
    /// the click threshold, otherwise the clamped preview for this frame of
    /// the gesture.
    pub fn update(
        &mut self,
        timeline: &Timeline,
        view: &Viewport,
        dx_px: f64,
        dy_px: f64,
        hover_track: Option<TrackId>,
        snap_opts: Option<&SnapOptions>,
    ) -> Result<Option<DragPreview>, TimelineError> {
        if self.state == DragState::PendingThreshold {
            if dx_px * dx_px + dy_px * dy_px < DRAG_THRESHOLD_PX * DRAG_THRESHOLD_PX {
                return Ok(None);
            }
            self.state = DragState::Dragging;
        }

        let anchor = self.origin(self.anchor)?;
        let raw_from = anchor.from + view.pixels_to_frames(dx_px);

        // In duplicate mode the originals stay real geometry, so their edges
        // remain snap targets; in move mode the group's own edges are not.
        let exclude: &[ItemId] = if self.duplicate { &[] } else { &self.members };
        let snapped = snap_opts
            .and_then(|opts| snap::snap_item(timeline, exclude, opts, raw_from, anchor.duration));
        let mut snap_kind = snapped.map(|s| s.kind);
        let target_from = snapped.map(|s| s.frame).unwrap_or(raw_from);

        let mut frame_offset = target_from - anchor.from;
        let earliest = self
            .members
            .iter()
            .filter_map(|id| self.origins.get(id))
            .map(|o| o.from)
            .min()
            .unwrap_or(anchor.from);
        if earliest + frame_offset < 0 {
            frame_offset = -earliest;
            snap_kind = None;
        }

        let track_offset = self.clamped_track_offset(timeline, hover_track)?;

        let preview = DragPreview {
            frame_offset,
            track_offset,
            snap: snap_kind,
        };
        self.last = Some(preview);
        Ok(Some(preview))
    }

    /// Land the gesture. A press that never crossed the threshold commits
    /// nothing. Collision for the whole group is resolved as a rigid body;
    /// if no legal placement exists the store is left untouched.
    pub fn commit(self, store: &mut TimelineStore) -> Result<Option<Commit>, TimelineError> {
        let preview = match self.last {
            Some(p) if self.state == DragState::Dragging => p,
            _ => return Ok(None),
        };

        let timeline = store.timeline();
        let rows = timeline.editable_tracks();
        let mut group = Vec::with_capacity(self.members.len());
        let mut targets = Vec::with_capacity(self.members.len());
        for &id in &self.members {
            let origin = self.origin(id)?;
            let row = rows
                .iter()
                .position(|t| t.id == origin.track_id)
                .ok_or(TimelineError::TrackNotFound(origin.track_id))?;
            let target_row = row as i64 + preview.track_offset;
            if target_row < 0 || target_row as usize >= rows.len() {
                return Err(TimelineError::InvalidEdit(format!(
                    "drag of {} leaves the track area",
                    id
                )));
            }
            let track_id = rows[target_row as usize].id;
            let from = origin.from + preview.frame_offset;
            group.push(GroupMember {
                id,
                track_id,
                from,
                duration: origin.duration,
            });
            targets.push(ItemMove {
                item_id: id,
                track_id,
                from,
            });
        }

        // Alt-drag copies collide with their own originals; a plain move
        // ignores the group's current positions.
        let exclude: &[ItemId] = if self.duplicate { &[] } else { &self.members };
        let shift =
            match collision::resolve_group_shift(timeline, &group, exclude, !self.duplicate) {
            Some(shift) => shift,
            None => {
                let (track_id, from) = group
                    .iter()
                    .find(|m| m.id == self.anchor)
                    .map(|m| (m.track_id, m.from))
                    .unwrap_or((self.origin(self.anchor)?.track_id, 0));
                return Err(TimelineError::NoSpace(track_id, from));
            }
        };
        for mv in &mut targets {
            mv.from += shift;
        }

        debug!(
            anchor = %self.anchor,
            members = targets.len(),
            shift,
            duplicate = self.duplicate,
            "drag commit"
        );
        let commit = if self.duplicate {
            store.duplicate_items(targets)?
        } else {
            store.move_items(targets)?
        };
        Ok(Some(commit))
    }

    fn origin(&self, id: ItemId) -> Result<Origin, TimelineError> {
        self.origins
            .get(&id)
            .copied()
            .ok_or(TimelineError::ItemNotFound(id))
    }

    /// Row delta from the anchor's home row to the hovered row, clamped so
    /// every member stays inside the editable rows.
    fn clamped_track_offset(
        &self,
        timeline: &Timeline,
        hover_track: Option<TrackId>,
    ) -> Result<i64, TimelineError> {
        let rows = timeline.editable_tracks();
        let anchor = self.origin(self.anchor)?;
        let anchor_row = rows
            .iter()
            .position(|t| t.id == anchor.track_id)
            .ok_or(TimelineError::TrackNotFound(anchor.track_id))? as i64;

        let hover_row = match hover_track.and_then(|h| rows.iter().position(|t| t.id == h)) {
            Some(row) => row as i64,
            None => return Ok(0),
        };
        let mut offset = hover_row - anchor_row;

        for &id in &self.members {
            let origin = self.origin(id)?;
            let row = rows
                .iter()
                .position(|t| t.id == origin.track_id)
                .ok_or(TimelineError::TrackNotFound(origin.track_id))?
                as i64;
            offset = offset.clamp(-row, rows.len() as i64 - 1 - row);
        }
        Ok(offset)
    }
}
